use std::rc::Rc;

use crate::{
    ArgumentVector, EvalResult, LookupResult, Message, PrimitiveContext,
    RuntimeError, UpdateResult, Value, has_prototype, lookup_value,
    primitives::{PrimitiveMessage, expect_object, expect_str, inputs},
    update_slot,
};

pub const PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("clone", 0, clone),
    PrimitiveMessage::new("proto", 0, proto),
    PrimitiveMessage::new("setProto", 1, set_proto),
    PrimitiveMessage::new("hasSlot", 1, has_slot),
    PrimitiveMessage::new("hasLocalSlot", 1, has_local_slot),
    PrimitiveMessage::new("getSlot", 1, get_slot),
    PrimitiveMessage::new("setSlot", 2, set_slot),
    PrimitiveMessage::new("updateSlot", 2, update),
    PrimitiveMessage::new("removeSlot", 1, remove_slot),
    PrimitiveMessage::new("slotNames", 0, slot_names),
    PrimitiveMessage::new("hasProto", 1, has_proto),
    PrimitiveMessage::variadic("perform", 1, perform),
    PrimitiveMessage::new("==", 1, equals),
    PrimitiveMessage::new("!=", 1, not_equals),
    PrimitiveMessage::new("isNil", 0, is_nil),
    PrimitiveMessage::new("not", 0, not),
    PrimitiveMessage::new("asString", 0, as_string),
    PrimitiveMessage::new("print", 0, print),
    PrimitiveMessage::new("println", 0, println),
    PrimitiveMessage::variadic("list", 0, list),
    PrimitiveMessage::new("uniqueId", 0, unique_id),
];

/// ( -- clone )
pub fn clone(ctx: &mut PrimitiveContext) -> EvalResult {
    let object = ctx.vm().clone_object(Some(ctx.receiver()));
    Ok(Value::Object(object))
}

pub fn proto(ctx: &mut PrimitiveContext) -> EvalResult {
    let proto = match ctx.receiver() {
        Value::Object(object) => object.prototype(),
        other => Some(ctx.vm().effective_prototype(other)),
    };
    Ok(proto.map_or(Value::Nil, Value::Object))
}

/// ( proto -- self )
pub fn set_proto(ctx: &mut PrimitiveContext) -> EvalResult {
    let [proto] = inputs(ctx);
    let target = expect_object(ctx.receiver())?;
    // Every object keeps a prototype.
    target.set_prototype(Some(expect_object(&proto)?));
    Ok(ctx.receiver().clone())
}

pub fn has_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    let found = lookup_value(&ctx.vm().specials, ctx.receiver(), &name).is_found();
    Ok(Value::from_bool(found))
}

pub fn has_local_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    let found = match ctx.receiver() {
        Value::Object(object) => object.has_slot(&name),
        _ => false,
    };
    Ok(Value::from_bool(found))
}

/// Read a slot without activating it. nil when missing.
pub fn get_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    Ok(lookup_value(&ctx.vm().specials, ctx.receiver(), &name)
        .value()
        .unwrap_or(Value::Nil))
}

/// ( name value -- value )
pub fn set_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name, value] = inputs(ctx);
    let name = expect_str(&name)?;
    expect_object(ctx.receiver())?.put(name, value.clone());
    Ok(value)
}

pub fn update(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name, value] = inputs(ctx);
    let name = expect_str(&name)?;
    match update_slot(&ctx.vm().specials, ctx.receiver(), &name, value) {
        UpdateResult::Updated(value) => Ok(value),
        UpdateResult::NotFound => {
            Err(RuntimeError::undefined(&name, ctx.message.location).into())
        }
    }
}

pub fn remove_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    let removed = expect_object(ctx.receiver())?.borrow_mut().remove_slot(&name);
    Ok(removed.unwrap_or(Value::Nil))
}

pub fn slot_names(ctx: &mut PrimitiveContext) -> EvalResult {
    let names = match ctx.receiver() {
        Value::Object(object) => object
            .slot_names()
            .into_iter()
            .map(Value::String)
            .collect(),
        _ => Vec::new(),
    };
    Ok(Value::new_list(names))
}

pub fn has_proto(ctx: &mut PrimitiveContext) -> EvalResult {
    let [candidate] = inputs(ctx);
    let candidate = expect_object(&candidate)?;
    let found = match ctx.receiver() {
        Value::Object(object) => has_prototype(object, &candidate),
        other => {
            let start = ctx.vm().effective_prototype(other);
            start == candidate || has_prototype(&start, &candidate)
        }
    };
    Ok(Value::from_bool(found))
}

/// ( name args... -- result ) send a message by name.
pub fn perform(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    let receiver = ctx.receiver().clone();
    let forwarded = ctx.arguments.len().saturating_sub(2);
    let message = Rc::new(Message::forwarding(&name, forwarded));

    match lookup_value(&ctx.vm().specials, &receiver, &name) {
        LookupResult::None => {
            Err(RuntimeError::undefined(&message.name, ctx.message.location).into())
        }
        LookupResult::Found { holder, value } => match value.as_invokable() {
            None => Ok(value),
            Some(invokable) => {
                let arguments: ArgumentVector =
                    ctx.arguments.iter().skip(2).cloned().collect();
                ctx.interpreter.invoke(
                    ctx.scope,
                    &invokable,
                    receiver,
                    Value::Object(holder),
                    &message,
                    arguments,
                )
            }
        },
    }
}

pub fn equals(ctx: &mut PrimitiveContext) -> EvalResult {
    let [other] = inputs(ctx);
    Ok(Value::from_bool(ctx.receiver().equals(&other)))
}

pub fn not_equals(ctx: &mut PrimitiveContext) -> EvalResult {
    let [other] = inputs(ctx);
    Ok(Value::from_bool(!ctx.receiver().equals(&other)))
}

pub fn is_nil(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::from_bool(ctx.receiver().is_nil()))
}

pub fn not(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::from_bool(!ctx.receiver().is_truthy()))
}

pub fn as_string(ctx: &mut PrimitiveContext) -> EvalResult {
    let text = ctx.display(ctx.receiver());
    Ok(Value::string(&text))
}

pub fn print(ctx: &mut PrimitiveContext) -> EvalResult {
    print!("{}", ctx.display(ctx.receiver()));
    Ok(ctx.receiver().clone())
}

pub fn println(ctx: &mut PrimitiveContext) -> EvalResult {
    println!("{}", ctx.display(ctx.receiver()));
    Ok(ctx.receiver().clone())
}

/// ( args... -- list )
pub fn list(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::new_list(ctx.rest().to_vec()))
}

pub fn unique_id(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(ctx
        .receiver()
        .identity()
        .map_or(Value::Nil, |id| Value::Integer(id as i64)))
}

//! Block, Function, Call, Message, Locals and Coroutine.

use std::rc::Rc;

use crate::{
    ArgumentVector, EvalResult, Invokable, PrimitiveContext, RuntimeError,
    Value,
    primitives::{PrimitiveMessage, expect_str, inputs},
};

pub const BLOCK_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::variadic("call", 0, invokable_call),
    PrimitiveMessage::new("argumentNames", 0, argument_names),
];

pub const FUNCTION_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::variadic("call", 0, invokable_call),
    PrimitiveMessage::new("argumentNames", 0, argument_names),
];

pub const CALL_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("sender", 0, call_sender),
    PrimitiveMessage::new("target", 0, call_target),
    PrimitiveMessage::new("message", 0, call_message),
    PrimitiveMessage::new("slotContext", 0, call_slot_context),
    PrimitiveMessage::new("activated", 0, call_activated),
    PrimitiveMessage::new("coroutine", 0, call_coroutine),
    PrimitiveMessage::new("argCount", 0, call_arg_count),
];

pub const MESSAGE_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("name", 0, message_name),
    PrimitiveMessage::new("argCount", 0, message_arg_count),
];

pub const LOCALS_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("self", 0, locals_self),
    PrimitiveMessage::new("getSlot", 1, locals_get_slot),
];

pub const COROUTINE_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("id", 0, coroutine_id),
    PrimitiveMessage::new("label", 0, coroutine_label),
];

fn receiver_invokable(ctx: &PrimitiveContext) -> Result<Invokable, RuntimeError> {
    ctx.receiver()
        .as_invokable()
        .ok_or_else(|| RuntimeError::type_error("Block", ctx.receiver()))
}

/// ( args... -- result ) activate the receiver itself.
pub fn invokable_call(ctx: &mut PrimitiveContext) -> EvalResult {
    let invokable = receiver_invokable(ctx)?;
    let receiver = ctx.receiver().clone();
    let slot_context = Value::Object(ctx.vm().effective_prototype(&receiver));
    let arguments: ArgumentVector = ctx.rest().iter().cloned().collect();
    ctx.interpreter.invoke(
        ctx.scope,
        &invokable,
        receiver,
        slot_context,
        ctx.message,
        arguments,
    )
}

pub fn argument_names(ctx: &mut PrimitiveContext) -> EvalResult {
    let invokable = receiver_invokable(ctx)?;
    let names = invokable
        .parameters()
        .iter()
        .cloned()
        .map(Value::String)
        .collect();
    Ok(Value::new_list(names))
}

// ── Call ──

fn with_call(
    ctx: &PrimitiveContext,
    read: fn(&crate::Call) -> Value,
) -> EvalResult {
    match ctx.receiver() {
        Value::Call(call) => Ok(read(call)),
        other => Err(RuntimeError::type_error("Call", other).into()),
    }
}

pub fn call_sender(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| Value::Locals(call.sender.clone()))
}

pub fn call_target(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| call.target.clone())
}

pub fn call_message(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| Value::Message(call.message.clone()))
}

pub fn call_slot_context(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| call.slot_context.clone())
}

pub fn call_activated(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| call.activated.to_value())
}

pub fn call_coroutine(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| Value::Coroutine(call.coroutine.clone()))
}

pub fn call_arg_count(ctx: &mut PrimitiveContext) -> EvalResult {
    with_call(ctx, |call| {
        Value::Integer(call.message.argument_count() as i64)
    })
}

// ── Message ──

pub fn message_name(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Message(message) => Ok(Value::String(message.name.clone())),
        other => Err(RuntimeError::type_error("Message", other).into()),
    }
}

pub fn message_arg_count(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Message(message) => {
            Ok(Value::Integer(message.argument_count() as i64))
        }
        other => Err(RuntimeError::type_error("Message", other).into()),
    }
}

// ── Locals ──

pub fn locals_self(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Locals(locals) => Ok(locals.self_value.clone()),
        other => Err(RuntimeError::type_error("Locals", other).into()),
    }
}

/// Variables first, then the slots of self. Never activates.
pub fn locals_get_slot(ctx: &mut PrimitiveContext) -> EvalResult {
    let [name] = inputs(ctx);
    let name = expect_str(&name)?;
    let locals = match ctx.receiver() {
        Value::Locals(locals) => Rc::clone(locals),
        other => return Err(RuntimeError::type_error("Locals", other).into()),
    };
    Ok(ctx
        .interpreter
        .read_variable(&locals, &name)
        .unwrap_or(Value::Nil))
}

// ── Coroutine ──

pub fn coroutine_id(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Coroutine(coroutine) => Ok(Value::Integer(coroutine.id() as i64)),
        other => Err(RuntimeError::type_error("Coroutine", other).into()),
    }
}

pub fn coroutine_label(ctx: &mut PrimitiveContext) -> EvalResult {
    match ctx.receiver() {
        Value::Coroutine(coroutine) => Ok(Value::string(coroutine.label())),
        other => Err(RuntimeError::type_error("Coroutine", other).into()),
    }
}

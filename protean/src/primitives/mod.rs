use std::rc::Rc;

use crate::{
    Function, Interpreter, ListRef, Locals, MapRef, Message, ObjectRef,
    PrimitiveFn, RuntimeError, VM, Value,
};

mod collections;
mod date;
mod exception;
mod numeric;
mod object;
mod reflection;
mod sequence;

// self does not count as input
// e.g. `3 + 4` has inputs: 1
#[derive(Debug, Copy, Clone)]
pub struct PrimitiveMessage<'a> {
    pub name: &'a str,
    pub inputs: usize,
    /// Accepts any number of arguments beyond `inputs`.
    pub variadic: bool,
    pub ptr: PrimitiveFn,
}

impl<'a> PrimitiveMessage<'a> {
    pub const fn new(name: &'a str, inputs: usize, ptr: PrimitiveFn) -> Self {
        Self {
            name,
            inputs,
            variadic: false,
            ptr,
        }
    }

    pub const fn variadic(name: &'a str, inputs: usize, ptr: PrimitiveFn) -> Self {
        Self {
            name,
            inputs,
            variadic: true,
            ptr,
        }
    }
}

pub struct PrimitiveContext<'a> {
    pub interpreter: &'a mut Interpreter,
    /// Scope of the sender.
    pub scope: &'a Rc<Locals>,
    /// `[receiver, arguments...]`, padded with nil up to the declared inputs.
    pub arguments: &'a [Value],
    pub message: &'a Rc<Message>,
}

impl PrimitiveContext<'_> {
    #[inline]
    pub fn receiver(&self) -> &Value {
        &self.arguments[0]
    }

    /// Everything after the receiver.
    #[inline]
    pub fn rest(&self) -> &[Value] {
        &self.arguments[1..]
    }

    #[inline]
    pub fn vm(&self) -> &VM {
        &self.interpreter.vm
    }

    pub fn display(&self, value: &Value) -> String {
        self.interpreter.display(value)
    }
}

/// The first `N` arguments after the receiver.
pub fn inputs<const N: usize>(ctx: &PrimitiveContext<'_>) -> [Value; N] {
    std::array::from_fn(|i| ctx.arguments.get(i + 1).cloned().unwrap_or(Value::Nil))
}

pub fn expect_object(value: &Value) -> Result<ObjectRef, RuntimeError> {
    match value {
        Value::Object(object) => Ok(object.clone()),
        other => Err(RuntimeError::type_error("Object", other)),
    }
}

pub fn expect_str(value: &Value) -> Result<Rc<str>, RuntimeError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(RuntimeError::type_error("Sequence", other)),
    }
}

/// Integral floats are accepted as indices.
pub fn expect_integer(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        other => Err(RuntimeError::type_error("Integer", other)),
    }
}

pub fn expect_list(value: &Value) -> Result<ListRef, RuntimeError> {
    match value {
        Value::List(list) => Ok(list.clone()),
        other => Err(RuntimeError::type_error("List", other)),
    }
}

pub fn expect_map(value: &Value) -> Result<MapRef, RuntimeError> {
    match value {
        Value::Map(map) => Ok(map.clone()),
        other => Err(RuntimeError::type_error("Map", other)),
    }
}

/// Install every primitive table on its shared prototype.
pub fn install(vm: &VM) {
    let specials = &vm.specials;
    let tables: [(&ObjectRef, &[PrimitiveMessage<'static>]); 13] = [
        (&specials.object, object::PRIMITIVES),
        (&specials.number, numeric::PRIMITIVES),
        (&specials.sequence, sequence::PRIMITIVES),
        (&specials.list, collections::LIST_PRIMITIVES),
        (&specials.map, collections::MAP_PRIMITIVES),
        (&specials.block, reflection::BLOCK_PRIMITIVES),
        (&specials.function, reflection::FUNCTION_PRIMITIVES),
        (&specials.call, reflection::CALL_PRIMITIVES),
        (&specials.message, reflection::MESSAGE_PRIMITIVES),
        (&specials.locals, reflection::LOCALS_PRIMITIVES),
        (&specials.coroutine, reflection::COROUTINE_PRIMITIVES),
        (&specials.date, date::PRIMITIVES),
        (&specials.exception, exception::PRIMITIVES),
    ];

    let mut count = 0;
    for (target, table) in tables {
        for primitive in table {
            let function = Function::primitive(
                primitive.name,
                primitive.inputs,
                primitive.variadic,
                primitive.ptr,
            );
            target.put(primitive.name, Value::Function(Rc::new(function)));
            count += 1;
        }
    }
    log::debug!("installed {count} primitives");
}

use crate::{
    EvalResult, ObjectRef, PrimitiveContext, RuntimeError, Value, lookup_value,
    primitives::{PrimitiveMessage, inputs},
};

pub const PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("raise", 1, raise),
    PrimitiveMessage::new("message", 0, message),
];

/// ( message -- ) raise a clone of the receiver carrying `message`.
pub fn raise(ctx: &mut PrimitiveContext) -> EvalResult {
    let [message] = inputs(ctx);
    let proto = ctx.vm().effective_prototype(ctx.receiver());
    let exception = ObjectRef::clone_of(&proto);
    exception.put("message", message.clone());

    let text = match &message {
        Value::Nil => "exception raised".to_string(),
        other => ctx.display(other),
    };
    log::debug!("raise: {text}");
    Err(RuntimeError::Exception {
        value: Value::Object(exception),
        message: text,
    }
    .into())
}

pub fn message(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(lookup_value(&ctx.vm().specials, ctx.receiver(), "message")
        .value()
        .filter(|value| !value.is_invokable())
        .unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Node, RuntimeError, VMCreateInfo, Value};

    #[test]
    fn uncaught_raise_is_an_exception_error() {
        let mut vm = Interpreter::new(VMCreateInfo::default());
        let node = Node::send(Node::ident("Exception"), "raise", vec![Node::string("boom")]);
        let report = vm.run(&node).unwrap_err();
        assert!(matches!(report.error, RuntimeError::Exception { .. }));
        assert_eq!(report.error.to_string(), "boom");
    }

    #[test]
    fn try_catches_raised_exception() {
        let mut vm = Interpreter::new(VMCreateInfo::default());
        let node = Node::try_catch(
            Node::send(Node::ident("Exception"), "raise", vec![Node::string("boom")]),
            "e",
            Node::send(Node::ident("e"), "message", vec![]),
        );
        let Ok(Value::String(text)) = vm.run(&node) else {
            panic!("expected the exception message");
        };
        assert_eq!(&*text, "boom");
    }

    #[test]
    fn try_wraps_runtime_errors() {
        let mut vm = Interpreter::new(VMCreateInfo::default());
        let node = Node::try_catch(
            Node::send(Node::Integer(1), "/", vec![Node::Integer(0)]),
            "e",
            Node::send(Node::ident("e"), "getSlot", vec![Node::string("name")]),
        );
        let Ok(Value::String(name)) = vm.run(&node) else {
            panic!("expected the error name");
        };
        assert_eq!(&*name, "DivisionByZero");
    }
}

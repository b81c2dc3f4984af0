use crate::{
    EvalResult, PrimitiveContext, RuntimeError, Value,
    primitives::{PrimitiveMessage, expect_integer, expect_str, inputs},
};

pub const PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("size", 0, size),
    PrimitiveMessage::new("at", 1, at),
    PrimitiveMessage::new("..", 1, concat),
    PrimitiveMessage::new("asString", 0, as_string),
    PrimitiveMessage::new("asNumber", 0, as_number),
];

/// Length in code points.
pub fn size(ctx: &mut PrimitiveContext) -> EvalResult {
    let text = expect_str(ctx.receiver())?;
    Ok(Value::Integer(text.chars().count() as i64))
}

/// ( index -- codepoint )
pub fn at(ctx: &mut PrimitiveContext) -> EvalResult {
    let [index] = inputs(ctx);
    let text = expect_str(ctx.receiver())?;
    let index = expect_integer(&index)?;

    let ch = usize::try_from(index)
        .ok()
        .and_then(|i| text.chars().nth(i));
    match ch {
        Some(ch) => Ok(Value::Integer(ch as i64)),
        None => Err(RuntimeError::OutOfBounds {
            index,
            length: text.chars().count(),
        }
        .into()),
    }
}

/// Anything on the right is appended in its display form.
pub fn concat(ctx: &mut PrimitiveContext) -> EvalResult {
    let [other] = inputs(ctx);
    let text = expect_str(ctx.receiver())?;
    let suffix = match &other {
        Value::String(suffix) => suffix.to_string(),
        other => ctx.display(other),
    };
    Ok(Value::string(&format!("{text}{suffix}")))
}

pub fn as_string(ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::String(expect_str(ctx.receiver())?))
}

/// nil if the text is not a number.
pub fn as_number(ctx: &mut PrimitiveContext) -> EvalResult {
    let text = expect_str(ctx.receiver())?;
    let text = text.trim();
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Value::Integer(integer));
    }
    Ok(text.parse::<f64>().map_or(Value::Nil, Value::Float))
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Node, RuntimeError, VMCreateInfo, Value};

    fn eval(node: Node) -> Result<Value, crate::ErrorReport> {
        Interpreter::new(VMCreateInfo::default()).run(&node)
    }

    #[test]
    fn size_counts_code_points() {
        let node = Node::send(Node::string("héllo"), "size", vec![]);
        assert!(matches!(eval(node), Ok(Value::Integer(5))));
    }

    #[test]
    fn at_out_of_bounds() {
        let node = Node::send(Node::string("ab"), "at", vec![Node::Integer(2)]);
        let report = eval(node).unwrap_err();
        assert!(matches!(
            report.error,
            RuntimeError::OutOfBounds { index: 2, length: 2 }
        ));
    }

    #[test]
    fn concat_displays_the_argument() {
        let node = Node::send(Node::string("n = "), "..", vec![Node::Integer(3)]);
        let Ok(Value::String(text)) = eval(node) else {
            panic!("expected a string");
        };
        assert_eq!(&*text, "n = 3");
    }

    #[test]
    fn parse_numbers() {
        let node = Node::send(Node::string(" 42 "), "asNumber", vec![]);
        assert!(matches!(eval(node), Ok(Value::Integer(42))));
        let node = Node::send(Node::string("x"), "asNumber", vec![]);
        assert!(matches!(eval(node), Ok(Value::Nil)));
    }
}

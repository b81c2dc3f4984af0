use crate::{
    EvalResult, PrimitiveContext, RuntimeError, Value,
    primitives::{
        PrimitiveMessage, expect_integer, expect_list, expect_map, expect_str,
        inputs,
    },
};

pub const LIST_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("clone", 0, list_clone),
    PrimitiveMessage::variadic("append", 1, list_append),
    PrimitiveMessage::new("at", 1, list_at),
    PrimitiveMessage::new("atPut", 2, list_at_put),
    PrimitiveMessage::new("size", 0, list_size),
    PrimitiveMessage::new("first", 0, list_first),
    PrimitiveMessage::new("last", 0, list_last),
    PrimitiveMessage::new("isEmpty", 0, list_is_empty),
    PrimitiveMessage::new("removeLast", 0, list_remove_last),
];

pub const MAP_PRIMITIVES: &[PrimitiveMessage<'static>] = &[
    PrimitiveMessage::new("clone", 0, map_clone),
    PrimitiveMessage::new("atPut", 2, map_at_put),
    PrimitiveMessage::new("at", 1, map_at),
    PrimitiveMessage::new("hasKey", 1, map_has_key),
    PrimitiveMessage::new("removeAt", 1, map_remove_at),
    PrimitiveMessage::new("size", 0, map_size),
    PrimitiveMessage::new("keys", 0, map_keys),
];

// ── List ──

/// A fresh empty list, whatever the receiver.
pub fn list_clone(_ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::new_list(Vec::new()))
}

/// ( items... -- self )
pub fn list_append(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    list.borrow_mut().extend(ctx.rest().iter().cloned());
    Ok(ctx.receiver().clone())
}

/// nil past the end.
pub fn list_at(ctx: &mut PrimitiveContext) -> EvalResult {
    let [index] = inputs(ctx);
    let list = expect_list(ctx.receiver())?;
    let index = expect_integer(&index)?;
    let item = usize::try_from(index)
        .ok()
        .and_then(|i| list.borrow().get(i).cloned());
    Ok(item.unwrap_or(Value::Nil))
}

/// ( index value -- value )
pub fn list_at_put(ctx: &mut PrimitiveContext) -> EvalResult {
    let [index, value] = inputs(ctx);
    let list = expect_list(ctx.receiver())?;
    let index = expect_integer(&index)?;

    let mut items = list.borrow_mut();
    let length = items.len();
    let position = usize::try_from(index).ok().filter(|&i| i < length);
    let Some(position) = position else {
        return Err(RuntimeError::OutOfBounds { index, length }.into());
    };
    items[position] = value.clone();
    Ok(value)
}

pub fn list_size(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    Ok(Value::Integer(list.borrow().len() as i64))
}

pub fn list_first(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    let first = list.borrow().first().cloned();
    Ok(first.unwrap_or(Value::Nil))
}

pub fn list_last(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    let last = list.borrow().last().cloned();
    Ok(last.unwrap_or(Value::Nil))
}

pub fn list_is_empty(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    Ok(Value::from_bool(list.borrow().is_empty()))
}

pub fn list_remove_last(ctx: &mut PrimitiveContext) -> EvalResult {
    let list = expect_list(ctx.receiver())?;
    let removed = list.borrow_mut().pop();
    Ok(removed.unwrap_or(Value::Nil))
}

// ── Map ──

pub fn map_clone(_ctx: &mut PrimitiveContext) -> EvalResult {
    Ok(Value::new_map())
}

/// ( key value -- self )
pub fn map_at_put(ctx: &mut PrimitiveContext) -> EvalResult {
    let [key, value] = inputs(ctx);
    let map = expect_map(ctx.receiver())?;
    map.borrow_mut().insert(expect_str(&key)?, value);
    Ok(ctx.receiver().clone())
}

pub fn map_at(ctx: &mut PrimitiveContext) -> EvalResult {
    let [key] = inputs(ctx);
    let map = expect_map(ctx.receiver())?;
    let key = expect_str(&key)?;
    let value = map.borrow().get(&key).cloned();
    Ok(value.unwrap_or(Value::Nil))
}

pub fn map_has_key(ctx: &mut PrimitiveContext) -> EvalResult {
    let [key] = inputs(ctx);
    let map = expect_map(ctx.receiver())?;
    let key = expect_str(&key)?;
    let found = map.borrow().contains_key(&key);
    Ok(Value::from_bool(found))
}

pub fn map_remove_at(ctx: &mut PrimitiveContext) -> EvalResult {
    let [key] = inputs(ctx);
    let map = expect_map(ctx.receiver())?;
    let key = expect_str(&key)?;
    let removed = map.borrow_mut().shift_remove(&key);
    Ok(removed.unwrap_or(Value::Nil))
}

pub fn map_size(ctx: &mut PrimitiveContext) -> EvalResult {
    let map = expect_map(ctx.receiver())?;
    Ok(Value::Integer(map.borrow().len() as i64))
}

/// Keys in insertion order.
pub fn map_keys(ctx: &mut PrimitiveContext) -> EvalResult {
    let map = expect_map(ctx.receiver())?;
    let keys = map.borrow().keys().cloned().map(Value::String).collect();
    Ok(Value::new_list(keys))
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Node, RuntimeError, VMCreateInfo, Value};

    fn eval(node: Node) -> Result<Value, crate::ErrorReport> {
        Interpreter::new(VMCreateInfo::default()).run(&node)
    }

    fn int(value: i64) -> Node {
        Node::Integer(value)
    }

    #[test]
    fn list_append_and_read() {
        let program = Node::seq(vec![
            Node::define("l", Node::send(Node::ident("List"), "clone", vec![])),
            Node::send(Node::ident("l"), "append", vec![int(1), int(2), int(3)]),
            Node::call(
                "list",
                vec![
                    Node::send(Node::ident("l"), "size", vec![]),
                    Node::send(Node::ident("l"), "last", vec![]),
                    Node::send(Node::ident("l"), "at", vec![int(9)]),
                ],
            ),
        ]);
        let Ok(Value::List(items)) = eval(program) else {
            panic!("expected a list");
        };
        let items = items.borrow();
        assert!(matches!(items[0], Value::Integer(3)));
        assert!(matches!(items[1], Value::Integer(3)));
        assert!(matches!(items[2], Value::Nil));
    }

    #[test]
    fn list_at_put_checks_bounds() {
        let program = Node::send(
            Node::call("list", vec![int(1)]),
            "atPut",
            vec![int(4), int(0)],
        );
        let report = eval(program).unwrap_err();
        assert!(matches!(
            report.error,
            RuntimeError::OutOfBounds { index: 4, length: 1 }
        ));
    }

    #[test]
    fn map_keys_keep_insertion_order() {
        let program = Node::seq(vec![
            Node::define("m", Node::send(Node::ident("Map"), "clone", vec![])),
            Node::send(Node::ident("m"), "atPut", vec![Node::string("b"), int(1)]),
            Node::send(Node::ident("m"), "atPut", vec![Node::string("a"), int(2)]),
            Node::send(Node::send(Node::ident("m"), "keys", vec![]), "asString", vec![]),
        ]);
        let Ok(Value::String(text)) = eval(program) else {
            panic!("expected a string");
        };
        assert_eq!(&*text, "list(b, a)");
    }

    #[test]
    fn map_lookup() {
        let program = Node::seq(vec![
            Node::define("m", Node::send(Node::ident("Map"), "clone", vec![])),
            Node::send(Node::ident("m"), "atPut", vec![Node::string("k"), int(7)]),
            Node::call(
                "list",
                vec![
                    Node::send(Node::ident("m"), "at", vec![Node::string("k")]),
                    Node::send(Node::ident("m"), "hasKey", vec![Node::string("z")]),
                ],
            ),
        ]);
        let Ok(Value::List(items)) = eval(program) else {
            panic!("expected a list");
        };
        let items = items.borrow();
        assert!(matches!(items[0], Value::Integer(7)));
        assert!(matches!(items[1], Value::False));
    }
}

use std::{cell::RefCell, fmt, rc::Rc};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num::BigInt;

use crate::{
    Block, Call, Coroutine, Function, Invokable, Locals, Message, Method,
    ObjectRef,
};

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type MapRef = Rc<RefCell<IndexMap<Rc<str>, Value>>>;

/// Every value the engine can hold.
///
/// Scalars (`Nil`, booleans, numbers, strings, dates) are immutable and
/// delegate to a shared prototype. Reference variants alias their target;
/// cloning a `Value` never copies the referenced object.
#[derive(Clone)]
pub enum Value {
    Nil,
    True,
    False,
    Integer(i64),
    BigInteger(Rc<BigInt>),
    Float(f64),
    String(Rc<str>),
    Object(ObjectRef),
    Function(Rc<Function>),
    Block(Rc<Block>),
    Method(Rc<Method>),
    List(ListRef),
    Map(MapRef),
    Message(Rc<Message>),
    Call(Rc<Call>),
    Locals(Rc<Locals>),
    Coroutine(Rc<Coroutine>),
    Date(DateTime<Utc>),
}

impl Value {
    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value { Value::True } else { Value::False }
    }

    pub fn string(text: &str) -> Self {
        Value::String(Rc::from(text))
    }

    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn new_map() -> Self {
        Value::Map(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// `nil` and `false` are the only false values.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::False)
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::BigInteger(_) | Value::Float(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::True => "True",
            Value::False => "False",
            Value::Integer(_) | Value::BigInteger(_) | Value::Float(_) => {
                "Number"
            }
            Value::String(_) => "Sequence",
            Value::Object(_) => "Object",
            Value::Function(_) => "Function",
            Value::Block(_) => "Block",
            Value::Method(_) => "Method",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Message(_) => "Message",
            Value::Call(_) => "Call",
            Value::Locals(_) => "Locals",
            Value::Coroutine(_) => "Coroutine",
            Value::Date(_) => "Date",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Classifies the value for dispatch; `None` for plain data.
    pub fn as_invokable(&self) -> Option<Invokable> {
        match self {
            Value::Function(function) => {
                Some(Invokable::Function(function.clone()))
            }
            Value::Block(block) => Some(Invokable::Block(block.clone())),
            Value::Method(method) => Some(Invokable::Method(method.clone())),
            _ => None,
        }
    }

    #[inline]
    pub fn is_invokable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Block(_) | Value::Method(_)
        )
    }

    /// Address of the referenced allocation, `None` for scalars.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::BigInteger(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::String(rc) => Some(Rc::as_ptr(rc) as *const u8 as usize),
            Value::Object(object) => Some(object.id()),
            Value::Function(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Block(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Method(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::List(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Map(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Message(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Call(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Locals(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Coroutine(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Nil
            | Value::True
            | Value::False
            | Value::Integer(_)
            | Value::Float(_)
            | Value::Date(_) => None,
        }
    }

    /// Language-level `==`: numbers and strings compare by value,
    /// everything else by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)
            | (Value::True, Value::True)
            | (Value::False, Value::False) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => {
                matches!(
                    crate::number::compare(a, b),
                    Ok(Some(std::cmp::Ordering::Equal))
                )
            }
            (a, b) => match (a.identity(), b.identity()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::from_bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

// Shallow on purpose: the object graph is cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::True => write!(f, "true"),
            Value::False => write!(f, "false"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::BigInteger(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value:?}"),
            Value::String(text) => write!(f, "{text:?}"),
            Value::Object(object) => write!(f, "Object@{:#x}", object.id()),
            Value::Function(function) => {
                write!(f, "Function({})", function.name)
            }
            Value::Block(block) => {
                write!(f, "Block({})", block.code.parameters.join(", "))
            }
            Value::Method(method) => {
                write!(f, "Method({})", method.code.parameters.join(", "))
            }
            Value::List(list) => write!(f, "List(len {})", list.borrow().len()),
            Value::Map(map) => write!(f, "Map(len {})", map.borrow().len()),
            Value::Message(message) => write!(f, "Message({})", message.name),
            Value::Call(call) => write!(f, "Call({})", call.message.name),
            Value::Locals(locals) => {
                write!(f, "Locals@{:#x}", Rc::as_ptr(locals) as usize)
            }
            Value::Coroutine(coroutine) => {
                write!(f, "Coroutine({})", coroutine.id())
            }
            Value::Date(date) => write!(f, "Date({})", date.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::False.is_truthy());
        assert!(Value::True.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert!(Value::Integer(3).equals(&Value::Float(3.0)));
        let big = Value::BigInteger(Rc::new(BigInt::from(7)));
        assert!(big.equals(&Value::Integer(7)));
        assert!(!Value::Integer(3).equals(&Value::string("3")));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = ObjectRef::new(Object::new(None));
        let b = ObjectRef::new(Object::new(None));
        assert!(Value::Object(a.clone()).equals(&Value::Object(a.clone())));
        assert!(!Value::Object(a).equals(&Value::Object(b)));
    }

    #[test]
    fn strings_compare_by_content() {
        assert!(Value::string("abc").equals(&Value::string("abc")));
        assert_eq!(Value::string("abc").type_name(), "Sequence");
    }

    #[test]
    fn data_values_are_not_invokable() {
        assert!(Value::Integer(1).as_invokable().is_none());
        assert!(!Value::new_list(vec![]).is_invokable());
    }
}

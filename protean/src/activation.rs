use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{Invokable, Message, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Top level: definitions land on `self` (the lobby).
    Module,
    Activation,
}

/// Materialized variable storage of one activation.
///
/// Frames are reference counted so blocks can keep them alive after the
/// activation returns.
#[derive(Debug)]
pub struct Frame {
    kind: FrameKind,
    /// Argument 0 of the activation: the receiver or a [`Call`].
    context: Value,
    variables: RefCell<IndexMap<Rc<str>, Value>>,
    outer: Option<Rc<Frame>>,
}

/// An activation scope: the self binding plus its frame.
#[derive(Debug)]
pub struct Locals {
    pub self_value: Value,
    pub frame: Rc<Frame>,
}

/// The reified context of one send, built only for bodies that read it.
#[derive(Debug)]
pub struct Call {
    pub sender: Rc<Locals>,
    pub target: Value,
    pub message: Rc<Message>,
    pub slot_context: Value,
    pub activated: Invokable,
    pub coroutine: Rc<Coroutine>,
}

/// Execution context identity. One per engine.
#[derive(Debug)]
pub struct Coroutine {
    id: u64,
    label: Rc<str>,
}

impl Frame {
    pub fn module() -> Rc<Self> {
        Rc::new(Self {
            kind: FrameKind::Module,
            context: Value::Nil,
            variables: RefCell::new(IndexMap::new()),
            outer: None,
        })
    }

    pub fn activation(context: Value, outer: Option<Rc<Frame>>) -> Rc<Self> {
        Rc::new(Self {
            kind: FrameKind::Activation,
            context,
            variables: RefCell::new(IndexMap::new()),
            outer,
        })
    }

    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    #[inline]
    pub fn context(&self) -> &Value {
        &self.context
    }

    #[inline]
    pub fn outer(&self) -> Option<&Rc<Frame>> {
        self.outer.as_ref()
    }

    /// Read a variable from this frame or the nearest enclosing one.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if let Some(value) = current.variables.borrow().get(name) {
                return Some(value.clone());
            }
            frame = current.outer.as_deref();
        }
        None
    }

    /// Overwrite an existing variable; `false` if no frame defines it.
    pub fn update(&self, name: &str, value: Value) -> bool {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if let Some(slot) = current.variables.borrow_mut().get_mut(name) {
                *slot = value;
                return true;
            }
            frame = current.outer.as_deref();
        }
        false
    }

    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) {
        self.variables.borrow_mut().insert(name.into(), value);
    }

    pub fn has_own_variable(&self, name: &str) -> bool {
        self.variables.borrow().contains_key(name)
    }

    pub fn variable_names(&self) -> Vec<Rc<str>> {
        self.variables.borrow().keys().cloned().collect()
    }
}

pub fn create_locals(self_value: Value, frame: Rc<Frame>) -> Rc<Locals> {
    Rc::new(Locals { self_value, frame })
}

pub fn create_call(
    sender: Rc<Locals>,
    target: Value,
    message: Rc<Message>,
    slot_context: Value,
    activated: Invokable,
    coroutine: Rc<Coroutine>,
) -> Rc<Call> {
    Rc::new(Call {
        sender,
        target,
        message,
        slot_context,
        activated,
        coroutine,
    })
}

impl Locals {
    #[inline]
    pub fn is_module(&self) -> bool {
        self.frame.kind() == FrameKind::Module
    }
}

impl Coroutine {
    pub fn new(id: u64, label: &str) -> Self {
        Self {
            id,
            label: Rc::from(label),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outer_frames() {
        let outer = Frame::activation(Value::Nil, None);
        outer.define("x", Value::Integer(1));
        let inner = Frame::activation(Value::Nil, Some(outer.clone()));
        inner.define("y", Value::Integer(2));

        assert!(matches!(inner.lookup("x"), Some(Value::Integer(1))));
        assert!(matches!(inner.lookup("y"), Some(Value::Integer(2))));
        assert!(outer.lookup("y").is_none());
    }

    #[test]
    fn update_targets_defining_frame() {
        let outer = Frame::activation(Value::Nil, None);
        outer.define("x", Value::Integer(1));
        let inner = Frame::activation(Value::Nil, Some(outer.clone()));

        assert!(inner.update("x", Value::Integer(10)));
        assert!(!inner.has_own_variable("x"));
        assert!(matches!(outer.lookup("x"), Some(Value::Integer(10))));
        assert!(!inner.update("missing", Value::Nil));
    }

    #[test]
    fn define_shadows_outer() {
        let outer = Frame::activation(Value::Nil, None);
        outer.define("x", Value::Integer(1));
        let inner = Frame::activation(Value::Nil, Some(outer.clone()));
        inner.define("x", Value::Integer(2));

        assert!(matches!(inner.lookup("x"), Some(Value::Integer(2))));
        assert!(matches!(outer.lookup("x"), Some(Value::Integer(1))));
    }

    #[test]
    fn locals_outlive_their_creator() {
        let locals = {
            let frame = Frame::activation(Value::Integer(3), None);
            frame.define("kept", Value::True);
            create_locals(Value::Integer(3), frame)
        };
        assert!(matches!(locals.frame.lookup("kept"), Some(Value::True)));
        assert!(!locals.is_module());
    }

    #[test]
    fn call_construction_does_not_touch_inputs() {
        use crate::{Code, Method, Node};

        let sender = create_locals(Value::Nil, Frame::module());
        let code = Rc::new(Code::new(&[], Node::Nil, true));
        let method = Invokable::Method(Rc::new(Method::new(code, None)));
        let message = Rc::new(Message::new("go", vec![]));
        let coroutine = Rc::new(Coroutine::new(1, "main"));

        let call = create_call(
            sender.clone(),
            Value::Integer(5),
            message.clone(),
            Value::Nil,
            method,
            coroutine,
        );

        assert!(Rc::ptr_eq(&call.sender, &sender));
        assert!(Rc::ptr_eq(&call.message, &message));
        assert!(sender.frame.variable_names().is_empty());
        assert_eq!(call.coroutine.id(), 1);
    }
}

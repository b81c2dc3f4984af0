//! Evaluator tree.
//!
//! Trees come from an external front end. Each [`Code`] already carries its
//! parameter names and the `uses_call_context` flag; the engine trusts
//! them. The constructors at the bottom exist for hosts and tests that
//! build trees by hand.

use std::{fmt, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The shape of one send: a name plus its unevaluated arguments.
#[derive(Debug)]
pub struct Message {
    pub name: Rc<str>,
    pub arguments: Vec<Node>,
    /// Already-evaluated arguments handed over by `perform`.
    pub forwarded: usize,
    pub location: Option<Location>,
}

impl Message {
    pub fn new(name: &str, arguments: Vec<Node>) -> Self {
        Self {
            name: Rc::from(name),
            arguments,
            forwarded: 0,
            location: None,
        }
    }

    /// A message reified for values that were evaluated elsewhere.
    pub fn forwarding(name: &str, count: usize) -> Self {
        Self {
            forwarded: count,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[inline]
    pub fn argument_count(&self) -> usize {
        self.arguments.len() + self.forwarded
    }
}

/// Body of a block, method or code function.
#[derive(Debug)]
pub struct Code {
    pub parameters: Vec<Rc<str>>,
    pub body: Node,
    /// Whether the body reads its own call context (`thisCall`).
    pub uses_call_context: bool,
}

impl Code {
    pub fn new(
        parameters: &[&str],
        body: Node,
        uses_call_context: bool,
    ) -> Self {
        Self {
            parameters: parameters.iter().map(|p| Rc::from(*p)).collect(),
            body,
            uses_call_context,
        }
    }

    /// Like [`Code::new`] but derives `uses_call_context` from the body.
    pub fn analyzed(parameters: &[&str], body: Node) -> Self {
        let uses_call_context = body.mentions_call_context();
        Self::new(parameters, body, uses_call_context)
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    /// `:=` creates or overwrites on the target itself.
    Define,
    /// `=` overwrites wherever the name is already defined.
    Update,
}

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub counter: Rc<str>,
    pub start: Node,
    pub end: Node,
    pub step: Option<Node>,
    pub body: Node,
}

#[derive(Debug, Clone)]
pub struct ForeachLoop {
    pub receiver: Node,
    pub index: Option<Rc<str>>,
    pub element: Rc<str>,
    pub body: Node,
}

#[derive(Debug, Clone)]
pub enum Node {
    Nil,
    True,
    False,
    Integer(i64),
    Float(f64),
    String(Rc<str>),

    SelfRef,
    /// The current activation's [`Call`](crate::Call), or nil.
    ThisCall,
    ThisLocals,

    /// Without a receiver the send goes through local variables first,
    /// then to `self`.
    Send {
        receiver: Option<Box<Node>>,
        message: Rc<Message>,
    },
    Assign {
        receiver: Option<Box<Node>>,
        name: Rc<str>,
        value: Box<Node>,
        kind: AssignKind,
    },
    Sequence(Vec<Node>),

    BlockLiteral(Rc<Code>),
    MethodLiteral(Rc<Code>),
    FunctionLiteral(Rc<Code>),

    If {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    For(Box<ForLoop>),
    Foreach(Box<ForeachLoop>),
    Break(Option<Box<Node>>),
    Continue,
    Return(Option<Box<Node>>),
    Try {
        body: Box<Node>,
        error_name: Rc<str>,
        handler: Box<Node>,
    },
}

impl Node {
    /// Does this body read its own call context?
    ///
    /// Nested code literals are not entered: they own their context.
    pub fn mentions_call_context(&self) -> bool {
        match self {
            Node::ThisCall => true,
            Node::Nil
            | Node::True
            | Node::False
            | Node::Integer(_)
            | Node::Float(_)
            | Node::String(_)
            | Node::SelfRef
            | Node::ThisLocals
            | Node::Continue
            | Node::BlockLiteral(_)
            | Node::MethodLiteral(_)
            | Node::FunctionLiteral(_) => false,
            Node::Send { receiver, message } => {
                receiver.as_deref().is_some_and(Node::mentions_call_context)
                    || message.arguments.iter().any(Node::mentions_call_context)
            }
            Node::Assign {
                receiver, value, ..
            } => {
                receiver.as_deref().is_some_and(Node::mentions_call_context)
                    || value.mentions_call_context()
            }
            Node::Sequence(nodes) => nodes.iter().any(Node::mentions_call_context),
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                condition.mentions_call_context()
                    || then.mentions_call_context()
                    || otherwise.as_deref().is_some_and(Node::mentions_call_context)
            }
            Node::While { condition, body } => {
                condition.mentions_call_context() || body.mentions_call_context()
            }
            Node::For(l) => {
                l.start.mentions_call_context()
                    || l.end.mentions_call_context()
                    || l.step.as_ref().is_some_and(Node::mentions_call_context)
                    || l.body.mentions_call_context()
            }
            Node::Foreach(l) => {
                l.receiver.mentions_call_context()
                    || l.body.mentions_call_context()
            }
            Node::Break(value) | Node::Return(value) => {
                value.as_deref().is_some_and(Node::mentions_call_context)
            }
            Node::Try { body, handler, .. } => {
                body.mentions_call_context() || handler.mentions_call_context()
            }
        }
    }

    pub fn string(text: &str) -> Self {
        Node::String(Rc::from(text))
    }

    /// `receiver name(arguments...)`
    pub fn send(receiver: Node, name: &str, arguments: Vec<Node>) -> Self {
        Node::Send {
            receiver: Some(Box::new(receiver)),
            message: Rc::new(Message::new(name, arguments)),
        }
    }

    /// `name(arguments...)` with the implicit receiver.
    pub fn call(name: &str, arguments: Vec<Node>) -> Self {
        Node::Send {
            receiver: None,
            message: Rc::new(Message::new(name, arguments)),
        }
    }

    /// A bare identifier.
    pub fn ident(name: &str) -> Self {
        Node::call(name, Vec::new())
    }

    pub fn sent_with(message: Message, receiver: Option<Node>) -> Self {
        Node::Send {
            receiver: receiver.map(Box::new),
            message: Rc::new(message),
        }
    }

    /// `name := value`
    pub fn define(name: &str, value: Node) -> Self {
        Node::assign(None, name, value, AssignKind::Define)
    }

    /// `name = value`
    pub fn update(name: &str, value: Node) -> Self {
        Node::assign(None, name, value, AssignKind::Update)
    }

    /// `receiver name := value`
    pub fn define_on(receiver: Node, name: &str, value: Node) -> Self {
        Node::assign(Some(receiver), name, value, AssignKind::Define)
    }

    /// `receiver name = value`
    pub fn update_on(receiver: Node, name: &str, value: Node) -> Self {
        Node::assign(Some(receiver), name, value, AssignKind::Update)
    }

    fn assign(
        receiver: Option<Node>,
        name: &str,
        value: Node,
        kind: AssignKind,
    ) -> Self {
        Node::Assign {
            receiver: receiver.map(Box::new),
            name: Rc::from(name),
            value: Box::new(value),
            kind,
        }
    }

    pub fn seq(nodes: Vec<Node>) -> Self {
        Node::Sequence(nodes)
    }

    pub fn block(parameters: &[&str], body: Node) -> Self {
        Node::BlockLiteral(Rc::new(Code::analyzed(parameters, body)))
    }

    pub fn method(parameters: &[&str], body: Node) -> Self {
        Node::MethodLiteral(Rc::new(Code::analyzed(parameters, body)))
    }

    pub fn function(parameters: &[&str], body: Node) -> Self {
        Node::FunctionLiteral(Rc::new(Code::new(parameters, body, false)))
    }

    pub fn if_else(condition: Node, then: Node, otherwise: Option<Node>) -> Self {
        Node::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        }
    }

    pub fn while_loop(condition: Node, body: Node) -> Self {
        Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        }
    }

    /// `for(counter, start, end, step, body)`
    pub fn for_loop(
        counter: &str,
        start: Node,
        end: Node,
        step: Option<Node>,
        body: Node,
    ) -> Self {
        Node::For(Box::new(ForLoop {
            counter: Rc::from(counter),
            start,
            end,
            step,
            body,
        }))
    }

    /// `receiver foreach(element, body)`
    pub fn foreach(receiver: Node, element: &str, body: Node) -> Self {
        Node::Foreach(Box::new(ForeachLoop {
            receiver,
            index: None,
            element: Rc::from(element),
            body,
        }))
    }

    /// `receiver foreach(index, element, body)`
    pub fn foreach_indexed(
        receiver: Node,
        index: &str,
        element: &str,
        body: Node,
    ) -> Self {
        Node::Foreach(Box::new(ForeachLoop {
            receiver,
            index: Some(Rc::from(index)),
            element: Rc::from(element),
            body,
        }))
    }

    pub fn break_with(value: Option<Node>) -> Self {
        Node::Break(value.map(Box::new))
    }

    pub fn return_with(value: Option<Node>) -> Self {
        Node::Return(value.map(Box::new))
    }

    pub fn try_catch(body: Node, error_name: &str, handler: Node) -> Self {
        Node::Try {
            body: Box::new(body),
            error_name: Rc::from(error_name),
            handler: Box::new(handler),
        }
    }
}

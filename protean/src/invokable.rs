use std::{fmt, rc::Rc};

use crate::{Code, EvalResult, Frame, Locals, PrimitiveContext, Value};

pub type PrimitiveFn = fn(&mut PrimitiveContext<'_>) -> EvalResult;

#[derive(Clone)]
pub enum FunctionBody {
    Primitive(PrimitiveFn),
    Code(Rc<Code>),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Primitive(_) => write!(f, "<primitive>"),
            FunctionBody::Code(code) => code.fmt(f),
        }
    }
}

/// A plain function: never rebinds self, never sees a call context.
#[derive(Debug)]
pub struct Function {
    pub name: Rc<str>,
    pub arity: usize,
    /// Variadic functions receive every supplied argument.
    pub variadic: bool,
    pub body: FunctionBody,
}

/// A closure over the scope it was created in.
#[derive(Debug)]
pub struct Block {
    pub code: Rc<Code>,
    /// Fixed at creation.
    pub sender: Rc<Locals>,
}

/// Rebinds self to the receiver on every activation.
#[derive(Debug)]
pub struct Method {
    pub code: Rc<Code>,
    pub outer_context: Option<Rc<Frame>>,
}

#[derive(Debug, Clone)]
pub enum Invokable {
    Function(Rc<Function>),
    Block(Rc<Block>),
    Method(Rc<Method>),
}

impl Function {
    pub fn primitive(
        name: &str,
        arity: usize,
        variadic: bool,
        ptr: PrimitiveFn,
    ) -> Self {
        Self {
            name: Rc::from(name),
            arity,
            variadic,
            body: FunctionBody::Primitive(ptr),
        }
    }

    pub fn from_code(name: &str, code: Rc<Code>) -> Self {
        Self {
            name: Rc::from(name),
            arity: code.arity(),
            variadic: false,
            body: FunctionBody::Code(code),
        }
    }
}

impl Block {
    pub fn new(code: Rc<Code>, sender: Rc<Locals>) -> Self {
        Self { code, sender }
    }
}

impl Method {
    pub fn new(code: Rc<Code>, outer_context: Option<Rc<Frame>>) -> Self {
        Self {
            code,
            outer_context,
        }
    }
}

impl Invokable {
    pub fn arity(&self) -> usize {
        match self {
            Invokable::Function(function) => function.arity,
            Invokable::Block(block) => block.code.arity(),
            Invokable::Method(method) => method.code.arity(),
        }
    }

    pub fn parameters(&self) -> &[Rc<str>] {
        match self {
            Invokable::Function(function) => match &function.body {
                FunctionBody::Primitive(_) => &[],
                FunctionBody::Code(code) => &code.parameters,
            },
            Invokable::Block(block) => &block.code.parameters,
            Invokable::Method(method) => &method.code.parameters,
        }
    }

    #[inline]
    pub fn uses_call_context(&self) -> bool {
        match self {
            Invokable::Function(_) => false,
            Invokable::Block(block) => block.code.uses_call_context,
            Invokable::Method(method) => method.code.uses_call_context,
        }
    }

    #[inline]
    pub fn is_variadic(&self) -> bool {
        matches!(self, Invokable::Function(function) if function.variadic)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Invokable::Function(_) => "Function",
            Invokable::Block(_) => "Block",
            Invokable::Method(_) => "Method",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Invokable::Function(function) => Value::Function(function.clone()),
            Invokable::Block(block) => Value::Block(block.clone()),
            Invokable::Method(method) => Value::Method(method.clone()),
        }
    }
}

use std::{fmt::Write, rc::Rc};

use thiserror::Error;

use crate::{Location, Value};

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("undefined name `{name}`{}", at_location(.location))]
    UndefinedName {
        name: Rc<str>,
        location: Option<Location>,
    },
    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },
    #[error("index {index} out of bounds for length {length}")]
    OutOfBounds { index: i64, length: usize },
    #[error("not implemented: {feature}")]
    NotImplemented { feature: &'static str },
    #[error(
        "`{name}` takes {expected} argument(s) but {given} were supplied"
    )]
    TooManyArguments {
        name: Rc<str>,
        expected: usize,
        given: usize,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("stack depth limit of {limit} exceeded")]
    StackOverflow { limit: usize },
    #[error("`{signal}` outside of a loop")]
    LoopSignalOutsideLoop { signal: &'static str },
    #[error("{message}")]
    Exception { value: Value, message: String },
}

fn at_location(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

impl RuntimeError {
    pub fn type_error(expected: &'static str, got: &Value) -> Self {
        RuntimeError::TypeError {
            expected,
            got: got.type_name(),
        }
    }

    pub fn undefined(name: &Rc<str>, location: Option<Location>) -> Self {
        RuntimeError::UndefinedName {
            name: name.clone(),
            location,
        }
    }

    /// Name of the error kind as seen by language-level handlers.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuntimeError::UndefinedName { .. } => "UndefinedName",
            RuntimeError::TypeError { .. } => "TypeError",
            RuntimeError::OutOfBounds { .. } => "OutOfBounds",
            RuntimeError::NotImplemented { .. } => "NotImplemented",
            RuntimeError::TooManyArguments { .. } => "TooManyArguments",
            RuntimeError::DivisionByZero => "DivisionByZero",
            RuntimeError::StackOverflow { .. } => "StackOverflow",
            RuntimeError::LoopSignalOutsideLoop { .. } => {
                "LoopSignalOutsideLoop"
            }
            RuntimeError::Exception { .. } => "Exception",
        }
    }
}

/// An error plus the logical call chain it unwound through,
/// innermost activation first.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ErrorReport {
    pub error: RuntimeError,
    pub backtrace: Vec<String>,
}

impl ErrorReport {
    pub fn new(error: RuntimeError) -> Self {
        Self {
            error,
            backtrace: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, entry: String) {
        self.backtrace.push(entry);
    }

    pub fn render(&self) -> String {
        let mut output = self.error.to_string();
        for entry in &self.backtrace {
            let _ = write!(&mut output, "\n    at {entry}");
        }
        output
    }
}

/// Everything that can unwind out of an evaluation.
///
/// Only `Error` is a failure; the others are bounded control transfers
/// consumed by the nearest loop or activation.
#[derive(Debug, Clone)]
pub enum Unwind {
    Error(Box<ErrorReport>),
    Break(Option<Value>),
    Continue,
    Return(Value),
}

pub type EvalResult = Result<Value, Unwind>;

impl Unwind {
    pub fn signal_name(&self) -> &'static str {
        match self {
            Unwind::Error(_) => "error",
            Unwind::Break(_) => "break",
            Unwind::Continue => "continue",
            Unwind::Return(_) => "return",
        }
    }
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(Box::new(ErrorReport::new(error)))
    }
}

impl From<ErrorReport> for Unwind {
    fn from(report: ErrorReport) -> Self {
        Unwind::Error(Box::new(report))
    }
}

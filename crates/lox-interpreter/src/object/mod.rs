mod callable;
mod function;
mod native;

use std::fmt::{self, Display, Formatter};
use std::io::Write;

pub use callable::Callable;
pub use function::Function;
use gc::{Finalize, Trace};
use lox_common::error::{Error, ErrorS, Result, TypeError};
use lox_common::types::Span;
pub use native::Native;

use crate::Interpreter;

#[derive(Clone, Debug, Finalize, Trace)]
pub enum Object {
    Bool(bool),
    Function(Function),
    Native(Native),
    Nil,
    Number(f64),
    String(String),
}

impl Object {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn bool(&self) -> bool {
        !matches!(self, Object::Nil | Object::Bool(false))
    }

    pub fn type_(&self) -> &'static str {
        match self {
            Object::Bool(_) => "bool",
            Object::Function(_) | Object::Native(_) => "function",
            Object::Nil => "nil",
            Object::Number(_) => "number",
            Object::String(_) => "string",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Object::Function(_) | Object::Native(_))
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        match self {
            Object::Function(function) => function.call(interpreter, args, span),
            Object::Native(native) => native.call(interpreter, args, span),
            object => Err(object.not_callable(span)),
        }
    }

    pub fn not_callable(&self, span: &Span) -> ErrorS {
        (Error::TypeError(TypeError::NotCallable { type_: self.type_().to_string() }), span.clone())
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Bool(bool) => write!(f, "{bool}"),
            Object::Function(function) => write!(f, "{function}"),
            Object::Native(native) => write!(f, "{native}"),
            Object::Nil => write!(f, "nil"),
            Object::Number(number) => write!(f, "{number}"),
            Object::String(string) => write!(f, "{string}"),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Bool(b1), Object::Bool(b2)) => b1 == b2,
            (Object::Function(f1), Object::Function(f2)) => f1 == f2,
            (Object::Native(n1), Object::Native(n2)) => n1 == n2,
            (Object::Nil, Object::Nil) => true,
            (Object::Number(n1), Object::Number(n2)) => n1 == n2,
            (Object::String(s1), Object::String(s2)) => s1 == s2,
            _ => false,
        }
    }
}

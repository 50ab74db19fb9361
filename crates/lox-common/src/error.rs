use crate::types::{Span, Spanned};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

pub type ErrorS = Spanned<Error>;
pub type Result<T, E = ErrorS> = std::result::Result<T, E>;

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("IOError: {0}")]
    IoError(IoError),
    #[error("NameError: {0}")]
    NameError(NameError),
    #[error("SyntaxError: {0}")]
    SyntaxError(SyntaxError),
    #[error("TypeError: {0}")]
    TypeError(TypeError),
}

/// Which phase an error belongs to. Static errors are found before the
/// program runs (lexing, parsing, resolution); runtime errors abort a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Static,
    Runtime,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NameError(NameError::NotDefined { .. })
            | Error::IoError(_)
            | Error::TypeError(_) => ErrorKind::Runtime,
            Error::NameError(_) | Error::SyntaxError(_) => ErrorKind::Static,
        }
    }

    pub fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        let code = match self {
            Error::IoError(_) => "IOError",
            Error::NameError(_) => "NameError",
            Error::SyntaxError(_) => "SyntaxError",
            Error::TypeError(_) => "TypeError",
        };
        Diagnostic::error()
            .with_code(code)
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("unable to write to file: {file:?}")]
    WriteError { file: String },
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum NameError {
    #[error("cannot refer to {name:?} in its own initializer")]
    AccessInsideInitializer { name: String },
    #[error("name {name:?} is already defined in this scope")]
    AlreadyDefined { name: String },
    #[error("name {name:?} is not defined")]
    NotDefined { name: String },
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    #[error("invalid assignment target")]
    InvalidAssignTarget,
    #[error(r#""return" outside function"#)]
    ReturnOutsideFunction,
    #[error("cannot have more than {max} {what}")]
    TooMany { what: &'static str, max: usize },
    #[error("unexpected input: {token:?}")]
    UnexpectedInput { token: String },
    #[error("unexpected end of file, expected {expected}")]
    UnrecognizedEOF { expected: String },
    #[error("unexpected {token:?}, expected {expected}")]
    UnrecognizedToken { token: String, expected: String },
    #[error("unterminated string")]
    UnterminatedString,
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    #[error("{name}() expected {exp_args} arguments but got {got_args}")]
    ArityMismatch { name: String, exp_args: usize, got_args: usize },
    #[error("can only call functions and classes, not {type_:?}")]
    NotCallable { type_: String },
    #[error("operands of {op} must be numbers, not {lt_type:?} and {rt_type:?}")]
    UnsupportedOperandInfix { op: String, lt_type: String, rt_type: String },
    #[error("operand of {op} must be a number, not {rt_type:?}")]
    UnsupportedOperandPrefix { op: String, rt_type: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn kind_separates_static_from_runtime() {
        let not_defined = Error::NameError(NameError::NotDefined { name: "a".to_string() });
        assert_eq!(not_defined.kind(), ErrorKind::Runtime);

        let shadowed = Error::NameError(NameError::AlreadyDefined { name: "a".to_string() });
        assert_eq!(shadowed.kind(), ErrorKind::Static);

        let return_ = Error::SyntaxError(SyntaxError::ReturnOutsideFunction);
        assert_eq!(return_.kind(), ErrorKind::Static);
    }

    #[test]
    fn arity_message_cites_both_counts() {
        let err = Error::TypeError(TypeError::ArityMismatch {
            name: "f".to_string(),
            exp_args: 2,
            got_args: 3,
        });
        assert_eq!(err.to_string(), "TypeError: f() expected 2 arguments but got 3");
    }
}

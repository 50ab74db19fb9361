use std::io::Write;

use lox_common::error::{Error, Result, TypeError};
use lox_common::types::Span;

use crate::object::Object;
use crate::Interpreter;

pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    fn call_unchecked<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object>;

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        span: &Span,
    ) -> Result<Object> {
        let exp_args = self.arity();
        let got_args = args.len();
        if exp_args != got_args {
            return Err((
                Error::TypeError(TypeError::ArityMismatch {
                    name: self.name().to_string(),
                    exp_args,
                    got_args,
                }),
                span.clone(),
            ));
        }
        self.call_unchecked(interpreter, args, span)
    }
}

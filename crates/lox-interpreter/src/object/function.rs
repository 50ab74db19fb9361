use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::ops::Deref;
use std::rc::Rc;

use gc::{Finalize, Gc, Trace};
use lox_common::error::Result;
use lox_common::types::{Span, Spanned};
use lox_syntax::ast::{StmtFun, StmtS};

use crate::env::Env;
use crate::interpreter::Flow;
use crate::object::{Callable, Object};
use crate::Interpreter;

/// A user-defined function together with the frame it was declared in.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFun>, env: &Env) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl), env: env.clone() }))
    }

    pub fn params(&self) -> &[Spanned<String>] {
        &self.decl.params
    }

    pub fn stmts(&self) -> &[StmtS] {
        &self.decl.body.stmts
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn name(&self) -> &str {
        &self.decl.name.0
    }

    fn call_unchecked<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        args: Vec<Object>,
        _span: &Span,
    ) -> Result<Object> {
        // Each call gets a fresh frame whose parent is the declaring frame,
        // not the caller's.
        let env = &mut Env::with_parent(&self.env);
        for ((param, _), arg) in self.params().iter().zip(args) {
            env.define(param, arg);
        }
        match interpreter.run_block(env, self.stmts())? {
            Flow::Returning(object) => Ok(object),
            Flow::Completed => Ok(Object::Nil),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Eq for Function {}

#[allow(clippy::from_over_into)]
impl Into<Object> for Function {
    fn into(self) -> Object {
        Object::Function(self)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    pub decl: Rc<StmtFun>,
    pub env: Env,
}

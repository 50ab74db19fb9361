use std::io::Write;

use lox_common::diagnostic::{Diagnostics, Reporter};
use lox_common::error::{Error, IoError, Result, TypeError};
use lox_syntax::ast::{
    Expr, ExprId, ExprLiteral, ExprS, OpInfix, OpLogical, OpPrefix, Program, Stmt, StmtS, Var,
};
use rustc_hash::FxHashMap;

use crate::env::Env;
use crate::object::{Callable, Function, Native, Object};
use crate::resolver::Resolver;

/// Resolved distance of every local variable reference. References absent
/// from the table are globals.
pub type Locals = FxHashMap<ExprId, usize>;

/// How a statement finished. A `return` unwinds every enclosing statement
/// up to the nearest call as `Returning`; errors travel separately as `Err`.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Completed,
    Returning(Object),
}

#[derive(Debug)]
pub struct Interpreter<W> {
    globals: Env,
    locals: Locals,
    stdout: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(stdout: W) -> Self {
        let mut globals = Env::default();
        for native in Native::ALL {
            let name = native.name().to_string();
            globals.define(&name, native.into());
        }
        Self { globals, locals: Locals::default(), stdout }
    }

    pub fn into_stdout(self) -> W {
        self.stdout
    }

    /// Resolves `program` and merges its distances into the side table.
    /// Resolution errors are reported but do not prevent a later
    /// [`Interpreter::interpret`].
    pub fn resolve<R: Reporter>(&mut self, program: &Program, diagnostics: &mut Diagnostics<R>) {
        let (locals, errors) = Resolver::default().resolve(program);
        self.locals.extend(locals);
        diagnostics.report_all(&errors);
    }

    /// Runs the top-level statements of `program` in order. The first
    /// runtime error is reported and stops the run.
    pub fn interpret<R: Reporter>(&mut self, program: &Program, diagnostics: &mut Diagnostics<R>) {
        let env = &mut self.globals.clone();
        for stmt_s in &program.stmts {
            match self.run_stmt(env, stmt_s) {
                Ok(Flow::Completed) => {}
                // A top-level return has already been reported by the
                // resolver; it simply ends the program.
                Ok(Flow::Returning(_)) => break,
                Err(error) => {
                    tracing::debug!(error = %error.0, span = ?error.1, "aborting on runtime error");
                    diagnostics.report(&error);
                    break;
                }
            }
        }
        if let Err(error) = self.stdout.flush() {
            tracing::debug!(%error, "unable to flush stdout");
        }
    }

    fn run_stmt(&mut self, env: &mut Env, stmt_s: &StmtS) -> Result<Flow> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Block(block) => {
                let env = &mut Env::with_parent(env);
                self.run_block(env, &block.stmts)
            }
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(Flow::Completed)
            }
            Stmt::Fun(fun) => {
                let function = Function::new(fun, env);
                env.define(&fun.name.0, function.into());
                Ok(Flow::Completed)
            }
            Stmt::If(if_) => {
                if self.run_expr(env, &if_.cond)?.bool() {
                    self.run_stmt(env, &if_.then)
                } else if let Some(else_) = &if_.else_ {
                    self.run_stmt(env, else_)
                } else {
                    Ok(Flow::Completed)
                }
            }
            Stmt::Print(print) => {
                let value = self.run_expr(env, &print.value)?;
                writeln!(self.stdout, "{value}").map_err(|_| {
                    (
                        Error::IoError(IoError::WriteError { file: "stdout".to_string() }),
                        span.clone(),
                    )
                })?;
                Ok(Flow::Completed)
            }
            Stmt::Return(return_) => {
                let object = match &return_.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                Ok(Flow::Returning(object))
            }
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Object::Nil,
                };
                env.define(&var.name.0, value);
                Ok(Flow::Completed)
            }
            Stmt::While(while_) => {
                while self.run_expr(env, &while_.cond)?.bool() {
                    if let flow @ Flow::Returning(_) = self.run_stmt(env, &while_.body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Completed)
            }
        }
    }

    /// Runs `stmts` in `env`, stopping at the first `return`.
    pub(crate) fn run_block(&mut self, env: &mut Env, stmts: &[StmtS]) -> Result<Flow> {
        for stmt_s in stmts {
            if let flow @ Flow::Returning(_) = self.run_stmt(env, stmt_s)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Completed)
    }

    fn run_expr(&mut self, env: &mut Env, expr_s: &ExprS) -> Result<Object> {
        let (expr, _) = expr_s;
        match expr {
            Expr::Assign(assign) => {
                let value = self.run_expr(env, &assign.value)?;
                let Var { id, name, span } = &assign.var;
                match self.locals.get(id) {
                    Some(&depth) => env.assign_at(name, value.clone(), depth, span)?,
                    None => self.globals.assign(name, value.clone(), span)?,
                }
                Ok(value)
            }
            Expr::Call(call) => {
                let callee = self.run_expr(env, &call.callee)?;
                if !callee.is_callable() {
                    return Err(callee.not_callable(&call.paren));
                }
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.run_expr(env, arg))
                    .collect::<Result<Vec<_>>>()?;
                tracing::trace!(callee = %callee, args = args.len(), "call");
                callee.call(self, args, &call.paren)
            }
            Expr::Grouping(inner) => self.run_expr(env, inner),
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                let rt = self.run_expr(env, &infix.rt)?;
                let (op, op_span) = &infix.op;
                match (*op, lt, rt) {
                    (OpInfix::Add, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a + b))
                    }
                    // Anything else is concatenated by its textual form.
                    (OpInfix::Add, a, b) => Ok(Object::String(format!("{a}{b}"))),
                    (OpInfix::Subtract, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a - b))
                    }
                    (OpInfix::Multiply, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a * b))
                    }
                    (OpInfix::Divide, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Number(a / b))
                    }
                    (OpInfix::Less, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a < b))
                    }
                    (OpInfix::LessEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a <= b))
                    }
                    (OpInfix::Greater, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a > b))
                    }
                    (OpInfix::GreaterEqual, Object::Number(a), Object::Number(b)) => {
                        Ok(Object::Bool(a >= b))
                    }
                    (OpInfix::Equal, a, b) => Ok(Object::Bool(a == b)),
                    (OpInfix::NotEqual, a, b) => Ok(Object::Bool(a != b)),
                    (op, a, b) => Err((
                        Error::TypeError(TypeError::UnsupportedOperandInfix {
                            op: op.to_string(),
                            lt_type: a.type_().to_string(),
                            rt_type: b.type_().to_string(),
                        }),
                        op_span.clone(),
                    )),
                }
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Nil => Object::Nil,
                ExprLiteral::Bool(bool) => Object::Bool(*bool),
                ExprLiteral::Number(number) => Object::Number(*number),
                ExprLiteral::String(string) => Object::String(string.clone()),
            }),
            Expr::Logical(logical) => {
                let lt = self.run_expr(env, &logical.lt)?;
                match (logical.op.0, lt.bool()) {
                    (OpLogical::And, false) | (OpLogical::Or, true) => Ok(lt),
                    _ => self.run_expr(env, &logical.rt),
                }
            }
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                let (op, op_span) = &prefix.op;
                match (*op, rt) {
                    (OpPrefix::Negate, Object::Number(number)) => Ok(Object::Number(-number)),
                    (OpPrefix::Not, rt) => Ok(Object::Bool(!rt.bool())),
                    (op, rt) => Err((
                        Error::TypeError(TypeError::UnsupportedOperandPrefix {
                            op: op.to_string(),
                            rt_type: rt.type_().to_string(),
                        }),
                        op_span.clone(),
                    )),
                }
            }
            Expr::Var(var) => {
                let Var { id, name, span } = &var.var;
                match self.locals.get(id) {
                    Some(&depth) => env.get_at(name, depth, span),
                    None => self.globals.get(name, span),
                }
            }
        }
    }
}

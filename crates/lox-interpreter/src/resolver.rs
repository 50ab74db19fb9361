use lox_common::error::{Error, ErrorS, NameError, SyntaxError};
use lox_common::types::Span;
use lox_syntax::ast::{Expr, ExprS, Program, Stmt, StmtFun, StmtS, Var};
use rustc_hash::FxHashMap;

use crate::interpreter::Locals;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum FunctionType {
    #[default]
    None,
    Function,
}

/// Computes, for every local variable reference, how many frames separate
/// it from its declaration. The global scope is not tracked: names that are
/// not found in any open scope are left out of the table and looked up in
/// the globals at runtime.
#[derive(Debug, Default)]
pub struct Resolver {
    scopes: Vec<FxHashMap<String, bool>>,
    locals: Locals,
    errors: Vec<ErrorS>,
    function: FunctionType,
}

impl Resolver {
    pub fn resolve(mut self, program: &Program) -> (Locals, Vec<ErrorS>) {
        for stmt_s in &program.stmts {
            self.resolve_stmt(stmt_s);
        }
        tracing::debug!(
            locals = self.locals.len(),
            errors = self.errors.len(),
            "resolved program"
        );
        (self.locals, self.errors)
    }

    fn resolve_stmt(&mut self, stmt_s: &StmtS) {
        let (stmt, _) = stmt_s;
        match stmt {
            Stmt::Block(block) => {
                self.begin_scope();
                for stmt_s in &block.stmts {
                    self.resolve_stmt(stmt_s);
                }
                self.end_scope();
            }
            Stmt::Expr(expr) => self.resolve_expr(&expr.value),
            Stmt::Fun(fun) => {
                // Defined before the body is resolved, so the function can
                // refer to itself.
                self.declare_define(&fun.name.0, &fun.name.1);
                self.resolve_fun(fun);
            }
            Stmt::If(if_) => {
                self.resolve_expr(&if_.cond);
                self.resolve_stmt(&if_.then);
                if let Some(else_) = &if_.else_ {
                    self.resolve_stmt(else_);
                }
            }
            Stmt::Print(print) => self.resolve_expr(&print.value),
            Stmt::Return(return_) => {
                if self.function == FunctionType::None {
                    self.errors.push((
                        Error::SyntaxError(SyntaxError::ReturnOutsideFunction),
                        return_.keyword.clone(),
                    ));
                }
                if let Some(value) = &return_.value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Var(var) => {
                self.declare(&var.name.0, &var.name.1);
                if let Some(value) = &var.value {
                    self.resolve_expr(value);
                }
                self.define(&var.name.0);
            }
            Stmt::While(while_) => {
                self.resolve_expr(&while_.cond);
                self.resolve_stmt(&while_.body);
            }
        }
    }

    fn resolve_expr(&mut self, expr_s: &ExprS) {
        let (expr, _) = expr_s;
        match expr {
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.value);
                self.resolve_local(&assign.var);
            }
            Expr::Call(call) => {
                self.resolve_expr(&call.callee);
                for arg in &call.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Infix(infix) => {
                self.resolve_expr(&infix.lt);
                self.resolve_expr(&infix.rt);
            }
            Expr::Literal(_) => {}
            Expr::Logical(logical) => {
                self.resolve_expr(&logical.lt);
                self.resolve_expr(&logical.rt);
            }
            Expr::Prefix(prefix) => self.resolve_expr(&prefix.rt),
            Expr::Var(var) => self.resolve_local(&var.var),
        }
    }

    /// Resolves a read of or an assignment to `var`. Inside the initializer
    /// of a local of the same name, `var` refers to the nearest enclosing
    /// binding instead, and it is an error if there is none.
    fn resolve_local(&mut self, var: &Var) {
        let initializing =
            self.scopes.last().map_or(false, |scope| scope.get(&var.name) == Some(&false));
        if !initializing {
            self.access(var, 0);
        } else if !self.access(var, 1) {
            self.errors.push((
                Error::NameError(NameError::AccessInsideInitializer { name: var.name.clone() }),
                var.span.clone(),
            ));
        }
    }

    fn resolve_fun(&mut self, fun: &StmtFun) {
        let enclosing = std::mem::replace(&mut self.function, FunctionType::Function);
        self.begin_scope();
        for (param, span) in &fun.params {
            self.declare_define(param, span);
        }
        for stmt_s in &fun.body.stmts {
            self.resolve_stmt(stmt_s);
        }
        self.end_scope();
        self.function = enclosing;
    }

    fn declare_define(&mut self, name: &str, span: &Span) {
        self.declare(name, span);
        self.define(name);
    }

    fn declare(&mut self, name: &str, span: &Span) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name) {
                self.errors.push((
                    Error::NameError(NameError::AlreadyDefined { name: name.to_string() }),
                    span.clone(),
                ));
            }
            scope.insert(name.to_string(), false);
        }
    }

    fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Records the distance to the innermost scope declaring `var`, ignoring
    /// the `skip` innermost scopes. Returns `false` if the name is global.
    fn access(&mut self, var: &Var, skip: usize) -> bool {
        let depth = self
            .scopes
            .iter()
            .rev()
            .enumerate()
            .skip(skip)
            .find_map(|(depth, scope)| scope.contains_key(&var.name).then_some(depth));
        match depth {
            Some(depth) => {
                self.locals.insert(var.id, depth);
                true
            }
            None => false,
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop().unwrap_or_else(|| unreachable!("attempted to pop global scope"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lox_syntax::ast::{ExprId, StmtExpr};
    use pretty_assertions::assert_eq;

    fn resolve(source: &str) -> (Program, Locals, Vec<ErrorS>) {
        let (program, errors) = lox_syntax::parse(source);
        assert_eq!(errors, vec![]);
        let (locals, errors) = Resolver::default().resolve(&program);
        (program, locals, errors)
    }

    /// Collects the ids of every variable read and assignment target, in
    /// resolution order.
    fn var_ids(stmts: &[StmtS], ids: &mut Vec<ExprId>) {
        fn expr_ids(expr: &ExprS, ids: &mut Vec<ExprId>) {
            match &expr.0 {
                Expr::Var(var) => ids.push(var.var.id),
                Expr::Assign(assign) => {
                    expr_ids(&assign.value, ids);
                    ids.push(assign.var.id);
                }
                Expr::Grouping(inner) => expr_ids(inner, ids),
                Expr::Infix(infix) => {
                    expr_ids(&infix.lt, ids);
                    expr_ids(&infix.rt, ids);
                }
                Expr::Call(call) => {
                    expr_ids(&call.callee, ids);
                    call.args.iter().for_each(|arg| expr_ids(arg, ids));
                }
                _ => {}
            }
        }
        for (stmt, _) in stmts {
            match stmt {
                Stmt::Block(block) => var_ids(&block.stmts, ids),
                Stmt::Fun(fun) => var_ids(&fun.body.stmts, ids),
                Stmt::Expr(StmtExpr { value }) => expr_ids(value, ids),
                Stmt::Print(print) => expr_ids(&print.value, ids),
                Stmt::Return(return_) => return_.value.iter().for_each(|v| expr_ids(v, ids)),
                Stmt::Var(var) => var.value.iter().for_each(|v| expr_ids(v, ids)),
                _ => {}
            }
        }
    }

    fn depths(source: &str) -> Vec<Option<usize>> {
        let (program, locals, errors) = resolve(source);
        assert_eq!(errors, vec![]);
        let mut ids = Vec::new();
        var_ids(&program.stmts, &mut ids);
        ids.iter().map(|id| locals.get(id).copied()).collect()
    }

    #[test]
    fn globals_are_unresolved() {
        assert_eq!(depths("var a = 1; print a;"), vec![None]);
    }

    #[test]
    fn distance_counts_enclosing_scopes() {
        let source = "{ var a = 1; { { print a; } print a; } }";
        assert_eq!(depths(source), vec![Some(2), Some(1)]);
    }

    #[test]
    fn shadowing_resolves_innermost() {
        let source = "{ var a = 1; { var a = 2; print a; } print a; }";
        assert_eq!(depths(source), vec![Some(0), Some(0)]);
    }

    #[test]
    fn function_body_shares_parameter_scope() {
        let source = "{ fun f(n) { print n; return f(n); } }";
        assert_eq!(depths(source), vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn initializer_reads_outer_binding_of_same_name() {
        let source = "{ var a = 1; { var a = a + 1; print a; } }";
        assert_eq!(depths(source), vec![Some(1), Some(0)]);
    }

    #[test]
    fn initializer_assigns_outer_binding_of_same_name() {
        let source = "{ var a = 1; { var a = (a = 5); print a; } }";
        assert_eq!(depths(source), vec![Some(1), Some(0)]);
    }

    #[test]
    fn assignment_inside_own_initializer() {
        let (_, _, errors) = resolve("{ var a = (a = 1); }");
        assert_eq!(
            errors,
            vec![(
                Error::NameError(NameError::AccessInsideInitializer { name: "a".to_string() }),
                11..12
            )]
        );
    }

    #[test]
    fn access_inside_own_initializer() {
        let (_, _, errors) = resolve("{ var a = a; }");
        assert_eq!(
            errors,
            vec![(
                Error::NameError(NameError::AccessInsideInitializer { name: "a".to_string() }),
                10..11
            )]
        );
    }

    #[test]
    fn top_level_self_initializer_is_not_an_error() {
        let (_, locals, errors) = resolve("var a = a;");
        assert_eq!(errors, vec![]);
        assert!(locals.is_empty());
    }

    #[test]
    fn duplicate_declaration_keeps_resolving() {
        let (_, _, errors) = resolve("{ var a = 1; var a = 2; var b; var b; }");
        assert_eq!(
            errors,
            vec![
                (Error::NameError(NameError::AlreadyDefined { name: "a".to_string() }), 17..18),
                (Error::NameError(NameError::AlreadyDefined { name: "b".to_string() }), 35..36),
            ]
        );
    }

    #[test]
    fn return_outside_function() {
        let (_, _, errors) = resolve("return 1; fun f() { return 2; }");
        assert_eq!(errors, vec![(Error::SyntaxError(SyntaxError::ReturnOutsideFunction), 0..6)]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let source = "fun outer() { var x = 1; fun inner() { x = x + 1; return x; } return inner; }
                      { var y = outer(); { print y(); } }";
        let (program, errors) = lox_syntax::parse(source);
        assert_eq!(errors, vec![]);
        let first = Resolver::default().resolve(&program);
        let second = Resolver::default().resolve(&program);
        assert_eq!(first, second);
    }
}

use std::rc::Rc;

use lox_common::error::{Error, ErrorS, Result, SyntaxError};

use crate::ast::{
    Expr, ExprAssign, ExprCall, ExprId, ExprInfix, ExprLiteral, ExprLogical, ExprPrefix, ExprS,
    ExprVar, OpInfix, OpLogical, OpPrefix, Program, Span, Spanned, Stmt, StmtBlock, StmtExpr,
    StmtFun, StmtIf, StmtPrint, StmtReturn, StmtS, StmtVar, StmtWhile, Var,
};
use crate::lexer::{Lexer, Token};

/// Maximum number of parameters a function may declare, and of arguments a
/// call may pass.
const MAX_ARGS: usize = 255;

/// Recursive descent parser. Syntax errors are collected rather than
/// returned, and parsing resumes at the next statement boundary.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned<Token>>,
    current: usize,
    next_id: u32,
    errors: Vec<ErrorS>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut errors = Vec::new();
        let tokens = Lexer::new(source)
            .filter_map(|token| match token {
                Ok(token) => Some(token),
                Err(e) => {
                    errors.push(e);
                    None
                }
            })
            .collect();
        Self { source, tokens, current: 0, next_id: 0, errors }
    }

    pub fn parse(mut self) -> (Program, Vec<ErrorS>) {
        let mut program = Program::default();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                program.stmts.push(stmt);
            }
        }
        (program, self.errors)
    }

    fn declaration(&mut self) -> Option<StmtS> {
        let start = self.peek_span().start;
        let result = if self.match_(&Token::Fun) {
            self.fun_decl(start)
        } else if self.match_(&Token::Var) {
            self.var_decl(start)
        } else {
            self.statement()
        };
        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn fun_decl(&mut self, start: usize) -> Result<StmtS> {
        let name = self.consume_identifier("function name")?;
        self.consume(&Token::LtParen, r#""(""#)?;
        let mut params = Vec::new();
        if !self.check(&Token::RtParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let error = SyntaxError::TooMany { what: "parameters", max: MAX_ARGS };
                    let span = self.peek_span();
                    self.errors.push((Error::SyntaxError(error), span));
                }
                params.push(self.consume_identifier("parameter name")?);
                if !self.match_(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(&Token::RtParen, r#"")""#)?;
        self.consume(&Token::LtBrace, r#""{""#)?;
        let stmts = self.block()?;
        let fun = StmtFun { name, params, body: StmtBlock { stmts } };
        Ok((Stmt::Fun(Rc::new(fun)), start..self.prev_end()))
    }

    fn var_decl(&mut self, start: usize) -> Result<StmtS> {
        let name = self.consume_identifier("variable name")?;
        let value = if self.match_(&Token::Equal) { Some(self.expression()?) } else { None };
        self.consume(&Token::Semicolon, r#"";""#)?;
        Ok((Stmt::Var(StmtVar { name, value }), start..self.prev_end()))
    }

    fn statement(&mut self) -> Result<StmtS> {
        let start = self.peek_span().start;
        match self.peek().cloned() {
            Some(Token::For) => {
                self.advance();
                self.for_stmt(start)
            }
            Some(Token::If) => {
                self.advance();
                let cond = self.paren_cond()?;
                let then = self.statement()?;
                let else_ =
                    if self.match_(&Token::Else) { Some(self.statement()?) } else { None };
                let if_ = StmtIf { cond, then, else_ };
                Ok((Stmt::If(Box::new(if_)), start..self.prev_end()))
            }
            Some(Token::Print) => {
                self.advance();
                let value = self.expression()?;
                self.consume(&Token::Semicolon, r#"";""#)?;
                Ok((Stmt::Print(StmtPrint { value }), start..self.prev_end()))
            }
            Some(Token::Return) => {
                let keyword = self.advance_span();
                let value =
                    if self.check(&Token::Semicolon) { None } else { Some(self.expression()?) };
                self.consume(&Token::Semicolon, r#"";""#)?;
                Ok((Stmt::Return(StmtReturn { keyword, value }), start..self.prev_end()))
            }
            Some(Token::While) => {
                self.advance();
                let cond = self.paren_cond()?;
                let body = self.statement()?;
                Ok((Stmt::While(Box::new(StmtWhile { cond, body })), start..self.prev_end()))
            }
            Some(Token::LtBrace) => {
                self.advance();
                let stmts = self.block()?;
                Ok((Stmt::Block(StmtBlock { stmts }), start..self.prev_end()))
            }
            _ => {
                let value = self.expression()?;
                self.consume(&Token::Semicolon, r#"";""#)?;
                Ok((Stmt::Expr(StmtExpr { value }), start..self.prev_end()))
            }
        }
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_stmt(&mut self, start: usize) -> Result<StmtS> {
        self.consume(&Token::LtParen, r#""(""#)?;
        let init = if self.match_(&Token::Semicolon) {
            None
        } else if self.check(&Token::Var) {
            let start = self.advance_span().start;
            Some(self.var_decl(start)?)
        } else {
            let start = self.peek_span().start;
            let value = self.expression()?;
            self.consume(&Token::Semicolon, r#"";""#)?;
            Some((Stmt::Expr(StmtExpr { value }), start..self.prev_end()))
        };
        let cond = if self.check(&Token::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(&Token::Semicolon, r#"";""#)?;
        let incr = if self.check(&Token::RtParen) { None } else { Some(self.expression()?) };
        self.consume(&Token::RtParen, r#"")""#)?;
        let mut body = self.statement()?;
        let span = start..self.prev_end();

        if let Some(incr) = incr {
            let incr_span = incr.1.clone();
            let stmts = vec![body, (Stmt::Expr(StmtExpr { value: incr }), incr_span)];
            body = (Stmt::Block(StmtBlock { stmts }), span.clone());
        }
        let cond = cond.unwrap_or_else(|| (Expr::Literal(ExprLiteral::Bool(true)), span.clone()));
        let while_ = (Stmt::While(Box::new(StmtWhile { cond, body })), span.clone());
        Ok(match init {
            Some(init) => (Stmt::Block(StmtBlock { stmts: vec![init, while_] }), span),
            None => while_,
        })
    }

    fn paren_cond(&mut self) -> Result<ExprS> {
        self.consume(&Token::LtParen, r#""(""#)?;
        let cond = self.expression()?;
        self.consume(&Token::RtParen, r#"")""#)?;
        Ok(cond)
    }

    /// Parses the rest of a block whose opening brace was already consumed.
    fn block(&mut self) -> Result<Vec<StmtS>> {
        let mut stmts = Vec::new();
        while !self.check(&Token::RtBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(&Token::RtBrace, r#""}""#)?;
        Ok(stmts)
    }

    fn expression(&mut self) -> Result<ExprS> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<ExprS> {
        let expr = self.logic_or()?;
        if !self.check(&Token::Equal) {
            return Ok(expr);
        }
        let equals = self.advance_span();
        let value = self.assignment()?;
        match expr {
            (Expr::Var(ExprVar { var }), span) => {
                let span = span.start..value.1.end;
                Ok((Expr::Assign(Box::new(ExprAssign { var, value })), span))
            }
            expr => {
                // Reported, but the parser is not confused so there is no
                // need to synchronize.
                self.errors.push((Error::SyntaxError(SyntaxError::InvalidAssignTarget), equals));
                Ok(expr)
            }
        }
    }

    fn logic_or(&mut self) -> Result<ExprS> {
        self.logical(Self::logic_and, &Token::Or, OpLogical::Or)
    }

    fn logic_and(&mut self) -> Result<ExprS> {
        self.logical(Self::equality, &Token::And, OpLogical::And)
    }

    fn logical(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        token: &Token,
        op: OpLogical,
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while self.check(token) {
            let op = (op, self.advance_span());
            let rt = operand(self)?;
            let span = lt.1.start..rt.1.end;
            lt = (Expr::Logical(Box::new(ExprLogical { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn equality(&mut self) -> Result<ExprS> {
        self.infix(Self::comparison, |token| match token {
            Token::BangEqual => Some(OpInfix::NotEqual),
            Token::EqualEqual => Some(OpInfix::Equal),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<ExprS> {
        self.infix(Self::term, |token| match token {
            Token::Greater => Some(OpInfix::Greater),
            Token::GreaterEqual => Some(OpInfix::GreaterEqual),
            Token::Less => Some(OpInfix::Less),
            Token::LessEqual => Some(OpInfix::LessEqual),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<ExprS> {
        self.infix(Self::factor, |token| match token {
            Token::Minus => Some(OpInfix::Subtract),
            Token::Plus => Some(OpInfix::Add),
            _ => None,
        })
    }

    fn factor(&mut self) -> Result<ExprS> {
        self.infix(Self::prefix, |token| match token {
            Token::Slash => Some(OpInfix::Divide),
            Token::Asterisk => Some(OpInfix::Multiply),
            _ => None,
        })
    }

    /// Parses a left-associative chain of infix operators.
    fn infix(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        ops: fn(&Token) -> Option<OpInfix>,
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while let Some(op) = self.peek().and_then(ops) {
            let op = (op, self.advance_span());
            let rt = operand(self)?;
            let span = lt.1.start..rt.1.end;
            lt = (Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn prefix(&mut self) -> Result<ExprS> {
        let op = match self.peek() {
            Some(Token::Bang) => OpPrefix::Not,
            Some(Token::Minus) => OpPrefix::Negate,
            _ => return self.call(),
        };
        let op_span = self.advance_span();
        let rt = self.prefix()?;
        let span = op_span.start..rt.1.end;
        Ok((Expr::Prefix(Box::new(ExprPrefix { op: (op, op_span), rt })), span))
    }

    fn call(&mut self) -> Result<ExprS> {
        let mut expr = self.primary()?;
        while self.match_(&Token::LtParen) {
            let mut args = Vec::new();
            if !self.check(&Token::RtParen) {
                loop {
                    if args.len() >= MAX_ARGS {
                        let error = SyntaxError::TooMany { what: "arguments", max: MAX_ARGS };
                        let span = self.peek_span();
                        self.errors.push((Error::SyntaxError(error), span));
                    }
                    args.push(self.expression()?);
                    if !self.match_(&Token::Comma) {
                        break;
                    }
                }
            }
            let paren = self.consume(&Token::RtParen, r#"")""#)?;
            let span = expr.1.start..paren.end;
            expr = (Expr::Call(Box::new(ExprCall { callee: expr, paren, args })), span);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<ExprS> {
        let (token, span) = match self.tokens.get(self.current) {
            Some((token, span)) => (token.clone(), span.clone()),
            None => return Err(self.unexpected("expression")),
        };
        let expr = match token {
            Token::False => Expr::Literal(ExprLiteral::Bool(false)),
            Token::True => Expr::Literal(ExprLiteral::Bool(true)),
            Token::Nil => Expr::Literal(ExprLiteral::Nil),
            Token::Number(number) => Expr::Literal(ExprLiteral::Number(number)),
            Token::String(string) => Expr::Literal(ExprLiteral::String(string)),
            Token::Identifier(name) => {
                Expr::Var(ExprVar { var: Var { id: self.fresh_id(), name, span: span.clone() } })
            }
            Token::LtParen => {
                self.advance();
                let inner = self.expression()?;
                let paren = self.consume(&Token::RtParen, r#"")""#)?;
                return Ok((Expr::Grouping(Box::new(inner)), span.start..paren.end));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok((expr, span))
    }

    /// Skips tokens until the start of the next statement.
    fn synchronize(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
        while let Some((token, _)) = self.tokens.get(self.current) {
            if let Some((Token::Semicolon, _)) = self.tokens.get(self.current - 1) {
                return;
            }
            match token {
                Token::Fun
                | Token::Var
                | Token::For
                | Token::If
                | Token::While
                | Token::Print
                | Token::Return => return,
                _ => self.current += 1,
            }
        }
    }

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn consume(&mut self, token: &Token, expected: &str) -> Result<Span> {
        if self.check(token) {
            Ok(self.advance_span())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<Spanned<String>> {
        match self.tokens.get(self.current) {
            Some((Token::Identifier(name), span)) => {
                let name = (name.clone(), span.clone());
                self.current += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> ErrorS {
        let expected = expected.to_string();
        match self.tokens.get(self.current) {
            Some((_, span)) => {
                let token = self.source[span.clone()].to_string();
                (Error::SyntaxError(SyntaxError::UnrecognizedToken { token, expected }), span.clone())
            }
            None => {
                let eof = self.source.len();
                (Error::SyntaxError(SyntaxError::UnrecognizedEOF { expected }), eof..eof)
            }
        }
    }

    fn match_(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|(token, _)| token)
    }

    fn peek_span(&self) -> Span {
        match self.tokens.get(self.current) {
            Some((_, span)) => span.clone(),
            None => self.source.len()..self.source.len(),
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn advance_span(&mut self) -> Span {
        let span = self.peek_span();
        self.advance();
        span
    }

    fn prev_end(&self) -> usize {
        self.current
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map_or(0, |(_, span)| span.end)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Program, Vec<ErrorS>) {
        Parser::new(source).parse()
    }

    #[test]
    fn parse_precedence() {
        let (program, errors) = parse("1 + 2 * 3;");
        assert_eq!(errors, vec![]);
        let (Stmt::Expr(StmtExpr { value: (Expr::Infix(infix), span) }), _) = &program.stmts[0]
        else {
            panic!("expected infix expression");
        };
        assert_eq!(span, &(0..9));
        assert_eq!(infix.op, (OpInfix::Add, 2..3));
        assert!(matches!(&infix.rt.0, Expr::Infix(rt) if rt.op.0 == OpInfix::Multiply));
    }

    #[test]
    fn variable_references_get_distinct_ids() {
        let (program, errors) = parse("x; x;");
        assert_eq!(errors, vec![]);
        let ids = program
            .stmts
            .iter()
            .map(|stmt| match stmt {
                (Stmt::Expr(StmtExpr { value: (Expr::Var(var), _) }), _) => var.var.id,
                _ => panic!("expected variable expression"),
            })
            .collect::<Vec<_>>();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn desugar_for_loop() {
        let (program, errors) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(errors, vec![]);
        let (Stmt::Block(block), _) = &program.stmts[0] else {
            panic!("expected block");
        };
        assert!(matches!(block.stmts[0].0, Stmt::Var(_)));
        let (Stmt::While(while_), _) = &block.stmts[1] else {
            panic!("expected while loop");
        };
        let (Stmt::Block(body), _) = &while_.body else {
            panic!("expected block around body and increment");
        };
        assert!(matches!(body.stmts[0].0, Stmt::Print(_)));
        assert!(matches!(body.stmts[1].0, Stmt::Expr(_)));
    }

    #[test]
    fn invalid_assignment_target() {
        let (_, errors) = parse("1 = 2;");
        assert_eq!(errors, vec![(Error::SyntaxError(SyntaxError::InvalidAssignTarget), 2..3)]);
    }

    #[test]
    fn recover_after_error() {
        let (program, errors) = parse("var = 1;\nprint 2;\nprint (;\nprint 3;");
        assert_eq!(
            errors,
            vec![
                (
                    Error::SyntaxError(SyntaxError::UnrecognizedToken {
                        token: "=".to_string(),
                        expected: "variable name".to_string()
                    }),
                    4..5
                ),
                (
                    Error::SyntaxError(SyntaxError::UnrecognizedToken {
                        token: ";".to_string(),
                        expected: "expression".to_string()
                    }),
                    25..26
                ),
            ]
        );
        assert_eq!(program.stmts.len(), 2);
    }

    #[test]
    fn missing_semicolon_at_end() {
        let (_, errors) = parse("print 1");
        assert_eq!(
            errors,
            vec![(
                Error::SyntaxError(SyntaxError::UnrecognizedEOF { expected: r#"";""#.to_string() }),
                7..7
            )]
        );
    }
}

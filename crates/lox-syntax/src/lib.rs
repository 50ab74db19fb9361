pub mod ast;
pub mod lexer;
pub mod parser;

use lox_common::error::ErrorS;

use crate::ast::Program;
use crate::parser::Parser;

/// Parses a whole program. Syntax errors do not stop the parser; every
/// statement that could be parsed is returned alongside all errors found.
pub fn parse(source: &str) -> (Program, Vec<ErrorS>) {
    Parser::new(source).parse()
}

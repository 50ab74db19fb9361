use logos::Logos;
use lox_common::error::{Error, ErrorS, SyntaxError};
use lox_common::types::{Span, Spanned};

/// Splits source text into spanned tokens. Input that forms no token is
/// reported as an error, with adjacent invalid characters merged into a
/// single error.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, Token>,
    pending: Option<Spanned<Token>>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { inner: Token::lexer(source), pending: None }
    }

    fn invalid_input(&mut self, mut span: Span) -> ErrorS {
        while let Some(token) = self.inner.next() {
            let next = self.inner.span();
            if token == Token::Error && next.start == span.end {
                span.end = next.end;
            } else {
                self.pending = Some((token, next));
                break;
            }
        }
        let token = self.inner.source()[span.clone()].to_string();
        (Error::SyntaxError(SyntaxError::UnexpectedInput { token }), span)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned<Token>, ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }

        let token = self.inner.next()?;
        let span = self.inner.span();
        if token != Token::Error {
            return Some(Ok((token, span)));
        }
        if self.inner.slice().starts_with('"') {
            return Some(Err((Error::SyntaxError(SyntaxError::UnterminatedString), span)));
        }
        Some(Err(self.invalid_input(span)))
    }
}

#[derive(Clone, Debug, Logos, PartialEq)]
pub enum Token {
    #[token("(")]
    LtParen,
    #[token(")")]
    RtParen,
    #[token("{")]
    LtBrace,
    #[token("}")]
    RtBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Operators.
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    #[regex(r#""[^"]*""#, |lex| lex.slice().trim_matches('"').to_string())]
    String(String),
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    // Keywords.
    #[token("and")]
    And,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("nil")]
    Nil,
    #[token("or")]
    Or,
    #[token("print")]
    Print,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("var")]
    Var,
    #[token("while")]
    While,

    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[error]
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> Vec<Result<Spanned<Token>, ErrorS>> {
        Lexer::new(source).collect()
    }

    #[test]
    fn invalid_characters_are_merged() {
        let exp = vec![
            Ok((Token::Var, 0..3)),
            Err((
                Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@#".to_string() }),
                4..6,
            )),
            Ok((Token::Identifier("x".to_string()), 6..7)),
            Err((
                Error::SyntaxError(SyntaxError::UnexpectedInput { token: ".".to_string() }),
                8..9,
            )),
        ];
        assert_eq!(lex("var @#x ."), exp);
    }

    #[test]
    fn unterminated_string() {
        let exp = vec![Err((Error::SyntaxError(SyntaxError::UnterminatedString), 0..5))];
        assert_eq!(lex("\"\nfoo"), exp);
    }

    #[test]
    fn literals_and_comments() {
        let exp = vec![
            Ok((Token::Print, 0..5)),
            Ok((Token::Number(1.5), 6..9)),
            Ok((Token::Plus, 10..11)),
            Ok((Token::String("hi".to_string()), 12..16)),
            Ok((Token::Semicolon, 16..17)),
        ];
        assert_eq!(lex("print 1.5 + \"hi\"; // trailing"), exp);
    }

    #[test]
    fn longest_operator_wins() {
        let tokens = lex("!= ! == = <= < >= >").into_iter().map(|token| token.map(|(t, _)| t));
        let exp = [
            Token::BangEqual,
            Token::Bang,
            Token::EqualEqual,
            Token::Equal,
            Token::LessEqual,
            Token::Less,
            Token::GreaterEqual,
            Token::Greater,
        ];
        assert_eq!(tokens.collect::<Vec<_>>(), exp.into_iter().map(Ok).collect::<Vec<_>>());
    }
}

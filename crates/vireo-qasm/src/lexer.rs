//! Lexer for the assembly circuit format.

use logos::Logos;

use crate::error::{ParseError, ParseResult};

/// Tokens of the assembly format.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("measure")]
    Measure,

    #[token("barrier")]
    Barrier,

    #[token("pi")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    })]
    StringLiteral(String),

    // Identifiers (gate and register names)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Measure => write!(f, "measure"),
            Token::Barrier => write!(f, "barrier"),
            Token::Pi => write!(f, "pi"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Tokenize a source string, reporting the byte offset of any bad input.
pub fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = vec![];
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(ParseError::LexerError {
                    position: lexer.span().start,
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_header() {
        let tokens = tokenize("OPENQASM 2.0;").unwrap();
        assert_eq!(
            tokens,
            vec![Token::OpenQasm, Token::FloatLiteral(2.0), Token::Semicolon]
        );
    }

    #[test]
    fn test_tokenize_gate() {
        let tokens = tokenize("rz(pi/2) q[0];").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("rz".into()),
                Token::LParen,
                Token::Pi,
                Token::Slash,
                Token::IntLiteral(2),
                Token::RParen,
                Token::Identifier("q".into()),
                Token::LBracket,
                Token::IntLiteral(0),
                Token::RBracket,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("// a comment\nh q[0]; // trailing\n").unwrap();
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_arrow() {
        let tokens = tokenize("measure q[0] -> c[0];").unwrap();
        assert!(tokens.contains(&Token::Arrow));
    }

    #[test]
    fn test_bad_input() {
        let err = tokenize("h q[0]; @").unwrap_err();
        assert!(matches!(err, ParseError::LexerError { position: 8 }));
    }
}

//! Signature tokenizer.

use std::ops::Range;

use logos::Logos;

use crate::error::{ParseErrorKind, SignatureParseError};

/// Token kinds of the signature grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("|")]
    Pipe,

    #[token("?")]
    Question,

    #[token(">")]
    Projection,

    #[regex(r"[^\[\]:|,?> \t\r\n]+")]
    Ident,
}

impl TokenKind {
    /// How the token reads in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Pipe => "`|`",
            TokenKind::Question => "`?`",
            TokenKind::Projection => "`>`",
            TokenKind::Ident => "a type or name",
        }
    }
}

/// A token with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Tokenize a signature, failing on the first unrecognised input.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, SignatureParseError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Lexeme { kind, span }),
            Err(()) => {
                return Err(SignatureParseError {
                    signature: source.to_string(),
                    kind: ParseErrorKind::InvalidCharacter(lexer.slice().to_string()),
                    span,
                });
            }
        }
    }

    Ok(tokens)
}

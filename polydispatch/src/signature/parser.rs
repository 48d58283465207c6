//! Signature parsing.

use std::ops::Range;

use super::lexer::{tokenize, Lexeme, TokenKind};
use super::{ParamGroup, Parameter, Signature, TypeToken};
use crate::error::{ParseErrorKind, SignatureParseError};

/// Parse signature text into a [`Signature`].
///
/// Every token of the input is accounted for: trailing garbage, empty
/// alternatives and mis-ordered groups are errors, never skipped.
pub fn parse(source: &str) -> Result<Signature, SignatureParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    parser.parse_signature()
}

/// A group as written, plus where it started.
struct RawGroup {
    group: ParamGroup,
    span: Range<usize>,
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn parse_signature(&mut self) -> Result<Signature, SignatureParseError> {
        if self.tokens.is_empty() {
            return Err(self.error(0..0, ParseErrorKind::Empty));
        }

        let groups = self.parse_groups()?;
        self.check_group_order(&groups)?;

        let projection = if self.try_consume(TokenKind::Projection).is_some() {
            Some(self.parse_projection()?)
        } else {
            None
        };

        if let Some(extra) = self.peek() {
            let (span, found) = (extra.span.clone(), self.text(&extra.span).to_string());
            return Err(self.error(
                span,
                ParseErrorKind::Unexpected {
                    found,
                    expected: "`[`, `>` or end of signature",
                },
            ));
        }

        let groups: Vec<ParamGroup> = groups.into_iter().map(|raw| raw.group).collect();
        let signature = Signature { groups, projection };

        if signature.projection.is_none() {
            let named = signature.params().filter(|p| p.name.is_some()).count();
            if named != 0 && named != signature.len() {
                return Err(self.error(0..self.source.len(), ParseErrorKind::MixedBindings));
            }
        }

        Ok(signature)
    }

    /// Parse one or more adjacent bracket groups.
    fn parse_groups(&mut self) -> Result<Vec<RawGroup>, SignatureParseError> {
        let mut groups = vec![self.parse_group()?];
        while self.check(TokenKind::LBracket) {
            groups.push(self.parse_group()?);
        }
        Ok(groups)
    }

    fn parse_group(&mut self) -> Result<RawGroup, SignatureParseError> {
        let open = self.expect(TokenKind::LBracket, "`[`")?;
        let mut params = Vec::new();

        if !self.check(TokenKind::RBracket) {
            params.push(self.parse_param()?);
            while self.try_consume(TokenKind::Comma).is_some() {
                params.push(self.parse_param()?);
            }
        }

        let close = self.expect(TokenKind::RBracket, "`,` or `]`")?;
        let mut end = close.end;
        let optional = match self.try_consume(TokenKind::Question) {
            Some(span) => {
                end = span.end;
                true
            }
            None => false,
        };

        Ok(RawGroup {
            group: ParamGroup { params, optional },
            span: open.start..end,
        })
    }

    fn parse_param(&mut self) -> Result<Parameter, SignatureParseError> {
        let first = self.expect(TokenKind::Ident, "a type token")?;
        let first_text = self.text(&first).to_string();

        if self.check(TokenKind::Pipe) {
            let mut alternatives = vec![first_text];
            let mut span = first.clone();
            while self.try_consume(TokenKind::Pipe).is_some() {
                let next = self.expect(TokenKind::Ident, "an alternative type token")?;
                let text = self.text(&next).to_string();
                if alternatives.contains(&text) {
                    return Err(self.error(next, ParseErrorKind::DuplicateAlternative(text)));
                }
                span.end = next.end;
                alternatives.push(text);
            }
            // alternation only composes with the un-named form
            if let Some(colon) = self.try_consume(TokenKind::Colon) {
                let text = self.text(&(span.start..colon.end)).to_string();
                return Err(self.error(span.start..colon.end, ParseErrorKind::BoundAlternation(text)));
            }
            return Ok(Parameter::new(TypeToken::Alternatives(alternatives)));
        }

        if self.try_consume(TokenKind::Colon).is_some() {
            let binding = self.expect(TokenKind::Ident, "a parameter name")?;
            let name = self.text(&binding).to_string();
            if let Some(pipe) = self.try_consume(TokenKind::Pipe) {
                let text = self.text(&(first.start..pipe.end)).to_string();
                return Err(self.error(first.start..pipe.end, ParseErrorKind::BoundAlternation(text)));
            }
            return Ok(Parameter::named(TypeToken::Single(first_text), name));
        }

        Ok(Parameter::new(TypeToken::Single(first_text)))
    }

    /// The right side of `>`: groups of plain names, flattened.
    fn parse_projection(&mut self) -> Result<Vec<String>, SignatureParseError> {
        let groups = self.parse_groups()?;
        let mut names = Vec::new();
        for raw in groups {
            for param in raw.group.params {
                match (param.ty, param.name) {
                    (TypeToken::Single(name), None) => names.push(name),
                    _ => return Err(self.error(raw.span, ParseErrorKind::InvalidProjection)),
                }
            }
        }
        Ok(names)
    }

    fn check_group_order(&self, groups: &[RawGroup]) -> Result<(), SignatureParseError> {
        let mut seen_optional = false;
        for raw in groups {
            if raw.group.optional {
                seen_optional = true;
            } else if seen_optional {
                return Err(self.error(raw.span.clone(), ParseErrorKind::MandatoryAfterOptional));
            }
        }
        Ok(())
    }

    // ============================================================
    // Token helpers
    // ============================================================

    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.pos)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |t| t.kind == kind)
    }

    fn try_consume(&mut self, kind: TokenKind) -> Option<Range<usize>> {
        if self.check(kind) {
            let span = self.tokens[self.pos].span.clone();
            self.pos += 1;
            Some(span)
        } else {
            None
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
    ) -> Result<Range<usize>, SignatureParseError> {
        if let Some(span) = self.try_consume(kind) {
            return Ok(span);
        }
        match self.peek() {
            Some(token) => {
                let span = token.span.clone();
                let found = self.text(&span).to_string();
                Err(self.error(span, ParseErrorKind::Unexpected { found, expected }))
            }
            None => {
                let end = self.source.len();
                Err(self.error(end..end, ParseErrorKind::UnexpectedEnd { expected }))
            }
        }
    }

    fn text(&self, span: &Range<usize>) -> &'src str {
        &self.source[span.clone()]
    }

    fn error(&self, span: Range<usize>, kind: ParseErrorKind) -> SignatureParseError {
        SignatureParseError {
            signature: self.source.to_string(),
            span,
            kind,
        }
    }
}

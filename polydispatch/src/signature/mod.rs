//! Overload signatures.
//!
//! A signature is one or more bracket groups of type tokens:
//!
//! ```text
//! Signature  ::= Groups ( '>' Groups )?
//! Groups     ::= Group+
//! Group      ::= '[' ( Token ( ',' Token )* )? ']' '?'?
//! Token      ::= NAME | NAME ':' BINDING | NAME ( '|' NAME )+
//! ```
//!
//! Groups marked `?` are optional trailing groups. A `>` projection lists
//! parameter names for the binder and overrides inline `:binding` suffixes;
//! it never takes part in dispatch.

mod lexer;
mod parser;

use std::fmt;

pub use lexer::{tokenize, Lexeme, TokenKind};
pub use parser::parse;

/// The type accepted at one parameter position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeToken {
    /// Exactly one type token.
    Single(String),
    /// Any of several type tokens, in declaration order.
    Alternatives(Vec<String>),
}

impl TypeToken {
    /// The concrete tokens this position accepts.
    pub fn choices(&self) -> &[String] {
        match self {
            TypeToken::Single(token) => std::slice::from_ref(token),
            TypeToken::Alternatives(tokens) => tokens,
        }
    }

    pub fn is_alternative(&self) -> bool {
        matches!(self, TypeToken::Alternatives(_))
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Single(token) => write!(f, "{token}"),
            TypeToken::Alternatives(tokens) => write!(f, "{}", tokens.join("|")),
        }
    }
}

/// One parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: TypeToken,
    pub name: Option<String>,
}

impl Parameter {
    pub fn new(ty: TypeToken) -> Self {
        Self { ty, name: None }
    }

    pub fn named(ty: TypeToken, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{name}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// A bracket group of parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGroup {
    pub params: Vec<Parameter>,
    pub optional: bool,
}

impl fmt::Display for ParamGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, "]")?;
        if self.optional {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// A parsed signature: mandatory groups followed by optional groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub groups: Vec<ParamGroup>,
    /// Names from a `>` projection, flattened across groups.
    pub projection: Option<Vec<String>>,
}

impl Signature {
    /// Parse signature text.
    pub fn parse(text: &str) -> Result<Self, crate::error::SignatureParseError> {
        parse(text)
    }

    /// All parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &Parameter> {
        self.groups.iter().flat_map(|g| g.params.iter())
    }

    /// Total number of parameter positions.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.params.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of positions in the mandatory groups.
    pub fn mandatory_len(&self) -> usize {
        self.groups
            .iter()
            .take_while(|g| !g.optional)
            .map(|g| g.params.len())
            .sum()
    }

    /// Names the binder should use, in position order.
    ///
    /// A projection wins over inline bindings. Empty means positional.
    pub fn param_names(&self) -> Vec<String> {
        if let Some(names) = &self.projection {
            return names.clone();
        }
        self.params().filter_map(|p| p.name.clone()).collect()
    }

    /// Whether any position holds an alternative set.
    pub fn has_alternatives(&self) -> bool {
        self.params().any(|p| p.ty.is_alternative())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{group}")?;
        }
        if let Some(names) = &self.projection {
            write!(f, " > [{}]", names.join(", "))?;
        }
        Ok(())
    }
}

/// A fully concrete signature: no optional groups, no alternatives.
///
/// Serialized as `[tok, tok, ...]`. This is the only form stored as a
/// dispatch table key, and call-time type keys share the representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(Vec<String>);

/// A canonical key computed from call-time argument classifications.
pub type TypeKey = CanonicalKey;

impl CanonicalKey {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is a token-order prefix of `other`.
    pub fn is_prefix_of(&self, other: &CanonicalKey) -> bool {
        other.0.starts_with(&self.0)
    }

    /// This key extended by further tokens.
    pub fn extended<I>(&self, tail: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut tokens = self.0.clone();
        tokens.extend(tail);
        Self(tokens)
    }
}

impl<S: Into<String>> FromIterator<S> for CanonicalKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

//! Error types for signature compilation and call dispatch.
//!
//! Compile-time failures surface from [`Engine::compile`](crate::Engine::compile)
//! as [`CompileError`]; call-time failures surface from
//! [`Resolver::call`](crate::Resolver::call) as [`DispatchError`].

use std::ops::Range;

use thiserror::Error;

use crate::signature::CanonicalKey;

/// Malformed signature text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid signature `{signature}` at {}..{}: {kind}", span.start, span.end)]
pub struct SignatureParseError {
    /// The signature text as written in the description.
    pub signature: String,
    /// Byte range of the offending input.
    pub span: Range<usize>,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// The specific grammar violation behind a [`SignatureParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("signature is empty")]
    Empty,

    #[error("unexpected `{found}`, expected {expected}")]
    Unexpected { found: String, expected: &'static str },

    #[error("unexpected end of signature, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unrecognised input `{0}`")]
    InvalidCharacter(String),

    #[error("alternation `{0}` cannot carry a binding")]
    BoundAlternation(String),

    #[error("alternative `{0}` is listed twice")]
    DuplicateAlternative(String),

    #[error("parameters must be either all named or all unnamed")]
    MixedBindings,

    #[error("mandatory group follows an optional group")]
    MandatoryAfterOptional,

    #[error("name projection may only list plain names")]
    InvalidProjection,
}

/// An alias chain that does not end at an implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasResolutionError {
    #[error("alias `{alias}` targets missing entry `{target}`")]
    MissingTarget { alias: String, target: String },

    #[error("alias `{alias}` exceeds the hop limit of {limit}")]
    HopLimitExceeded { alias: String, limit: usize },

    #[error("alias `{alias}` forms a cycle: {}", cycle.join(" -> "))]
    Cycle { alias: String, cycle: Vec<String> },
}

/// No table key matched the call-time type key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Overload failed for {key}")]
pub struct DispatchMissError {
    /// The type key computed from the supplied arguments.
    pub key: CanonicalKey,
}

/// Errors raised while compiling a description into a dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] SignatureParseError),

    #[error(transparent)]
    Alias(#[from] AliasResolutionError),

    #[error("`{second}` and `{first}` both expand to {key}")]
    Collision {
        key: CanonicalKey,
        first: String,
        second: String,
    },

    #[error("`{signature}` still holds alternatives in shape `{shape}` after all stages ran")]
    UnexpandedShape { signature: String, shape: String },

    #[error("`{signature}` declares {defaults} defaults but only {params} parameters")]
    DefaultsOverflow {
        signature: String,
        defaults: usize,
        params: usize,
    },

    #[error("stage `{stage}` failed: {message}")]
    Stage { stage: &'static str, message: String },
}

/// Errors raised while dispatching a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Miss(#[from] DispatchMissError),

    #[error("{supplied} arguments supplied but only {} names bound ({})", names.len(), names.join(", "))]
    Binding { supplied: usize, names: Vec<String> },

    #[error("{0}")]
    Failed(String),
}

impl DispatchError {
    /// Build a failure raised by an implementation body.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type for dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

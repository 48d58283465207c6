//! Polydispatch
//!
//! Multiple dispatch over runtime-classified argument shapes. An author
//! writes a [`Description`] mapping signature text to implementations; the
//! [`Engine`] compiles it into a [`Resolver`] that picks the implementation
//! for each call from the classified types of its arguments.
//!
//! # Signatures
//!
//! - `[array, number]`: two positional parameters
//! - `[array:list, number:count]`: inline parameter names
//! - `[array] [object]?`: an optional trailing group
//! - `[string|number]`: alternatives, one key per choice
//! - `[array, object] > [list, options]`: a name projection
//!
//! # Example
//!
//! ```rust
//! use polydispatch::{compile, Description, Value};
//!
//! let desc = Description::new()
//!     .method("[array:list] [object:options]?", |args| args.into_value())
//!     .alias("[string]", "[array]");
//! let resolver = compile(&desc)?;
//!
//! let result = resolver.call(vec![Value::array([1, 2])])?;
//! assert_eq!(result.property("list"), Some(&Value::array([1, 2])));
//!
//! let miss = resolver.call(vec![Value::from(1)]).unwrap_err();
//! assert_eq!(miss.to_string(), "Overload failed for [number]");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bind;
pub mod classify;
pub mod config;
pub mod description;
pub mod engine;
pub mod error;
pub mod expand;
pub mod pipeline;
pub mod resolver;
pub mod signature;
pub mod table;
pub mod value;

pub use bind::{bind, CallArgs, Implementation};
pub use classify::{Classifier, ClassifierRule};
pub use config::{CollisionPolicy, EngineConfig};
pub use description::{Description, Entry, Overload};
pub use engine::{Engine, EngineBuilder};
pub use error::{
    AliasResolutionError, CompileError, CompileResult, DispatchError, DispatchMissError,
    DispatchResult, ParseErrorKind, SignatureParseError,
};
pub use expand::expand;
pub use pipeline::{PlannedEntry, Stage, Target, TokenSynonyms};
pub use resolver::{Resolver, Selection, SharedResolver};
pub use signature::{CanonicalKey, Signature, TypeKey};
pub use table::{DispatchTable, EntryId, ResolvedEntry};
pub use value::{Constructor, HostObject, Value};

/// Compiles a description with a default [`Engine`].
pub fn compile(description: &Description) -> CompileResult<Resolver> {
    Engine::new().compile(description)
}

//! Call-time dispatch.
//!
//! Resolution is a single pass: classify the arguments into a type key,
//! look the key up, invoke. When the raw key misses, entries that declare
//! defaults get a chance: the missing trailing arguments are padded from the
//! entry's defaults and the padded key is looked up again.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use crate::bind::{CallArgs, Implementation};
use crate::classify::Classifier;
use crate::error::{DispatchMissError, DispatchResult};
use crate::signature::TypeKey;
use crate::table::{DispatchTable, ResolvedEntry};
use crate::value::Value;

/// The outcome of a successful lookup.
#[derive(Debug)]
pub struct Selection<'a> {
    pub entry: &'a ResolvedEntry,
    /// The type key that matched, including any padded positions.
    pub key: TypeKey,
    /// Values appended to the supplied arguments before the call.
    pub padding: &'a [Value],
}

/// Find the entry that handles `args`.
pub fn select<'t>(
    table: &'t DispatchTable,
    classifier: &Classifier,
    args: &[Value],
) -> Result<Selection<'t>, DispatchMissError> {
    let key = classifier.type_key(args);

    if let Some(entry) = table.lookup(&key) {
        trace!(key = %key, entry = %entry.source, "dispatch hit");
        let padding = entry.defaults.get(args.len()..).unwrap_or(&[]);
        return Ok(Selection { entry, key, padding });
    }

    for entry in table.padded_entries() {
        let Some(tail) = entry.default_tokens.get(args.len()..) else {
            continue;
        };
        if tail.is_empty() {
            continue;
        }
        let padded = key.extended(tail.iter().cloned());
        if table.lookup(&padded).map(|hit| hit.id) == Some(entry.id) {
            trace!(key = %key, padded = %padded, entry = %entry.source, "dispatch hit after padding");
            return Ok(Selection {
                entry,
                key: padded,
                padding: &entry.defaults[args.len()..],
            });
        }
    }

    trace!(key = %key, "dispatch miss");
    Err(DispatchMissError { key })
}

/// Dispatch `args` through `table` and invoke the selected implementation.
pub fn resolve(
    table: &DispatchTable,
    classifier: &Classifier,
    mut args: Vec<Value>,
) -> DispatchResult<Value> {
    let selection = select(table, classifier, &args)?;
    args.extend_from_slice(selection.padding);
    selection
        .entry
        .implementation
        .invoke(CallArgs::Positional(args))
}

/// A compiled overload: a frozen table plus the classifier it was built for.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<DispatchTable>,
    classifier: Arc<Classifier>,
}

impl Resolver {
    pub fn new(table: DispatchTable, classifier: Arc<Classifier>) -> Self {
        Self {
            table: Arc::new(table),
            classifier,
        }
    }

    /// Dispatch and invoke.
    pub fn call(&self, args: Vec<Value>) -> DispatchResult<Value> {
        resolve(&self.table, &self.classifier, args)
    }

    /// Find the handling entry without invoking it.
    pub fn select(&self, args: &[Value]) -> Result<Selection<'_>, DispatchMissError> {
        select(&self.table, &self.classifier, args)
    }

    /// The type key `args` classify to.
    pub fn type_key(&self, args: &[Value]) -> TypeKey {
        self.classifier.type_key(args)
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Use this resolver as an implementation inside another description.
    pub fn into_implementation(self) -> Implementation {
        Implementation::fallible(move |args| self.call(args.into_values())).with_label("overload")
    }
}

/// A resolver reference that can be replaced while readers are live.
///
/// Readers load the current resolver; a rebuild compiles a complete new
/// resolver first and then swaps it in. Tables are never mutated in place.
#[derive(Debug)]
pub struct SharedResolver {
    current: ArcSwap<Resolver>,
}

impl SharedResolver {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            current: ArcSwap::from_pointee(resolver),
        }
    }

    /// The resolver readers currently see.
    pub fn load(&self) -> Arc<Resolver> {
        self.current.load_full()
    }

    /// Swap in a fully built resolver, returning the previous one.
    pub fn publish(&self, resolver: Resolver) -> Arc<Resolver> {
        self.current.swap(Arc::new(resolver))
    }

    pub fn call(&self, args: Vec<Value>) -> DispatchResult<Value> {
        self.current.load().call(args)
    }
}

//! Overload descriptions.
//!
//! A [`Description`] is authored data: signature text mapped to what runs
//! for it. It is read, never modified, by compilation.

use indexmap::IndexMap;

use crate::bind::{CallArgs, Implementation};
use crate::value::Value;

/// What a signature maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Call this implementation.
    Method(Implementation),
    /// Redirect to another entry, by description key or canonical key.
    Alias(String),
    /// List-form entry carrying its own defaults.
    Overload(Overload),
}

/// A list-form overload: `{ defaults, arguments, method }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Overload {
    /// Signature text.
    pub arguments: String,
    /// Values padded onto missing trailing arguments, by position.
    pub defaults: Vec<Value>,
    pub method: Implementation,
}

impl Overload {
    pub fn new(arguments: impl Into<String>, method: Implementation) -> Self {
        Self {
            arguments: arguments.into(),
            defaults: Vec::new(),
            method,
        }
    }

    pub fn with_defaults(mut self, defaults: Vec<Value>) -> Self {
        self.defaults = defaults;
        self
    }
}

/// Signature text mapped to entries, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
    entries: IndexMap<String, Entry>,
}

impl Description {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a description from list-form overloads.
    pub fn from_list<I>(overloads: I) -> Self
    where
        I: IntoIterator<Item = Overload>,
    {
        overloads
            .into_iter()
            .fold(Self::new(), |desc, overload| desc.overload(overload))
    }

    /// Map a signature to a closure. The implementation is labelled with the
    /// signature text.
    pub fn method<F>(self, signature: &str, f: F) -> Self
    where
        F: Fn(CallArgs) -> Value + Send + Sync + 'static,
    {
        let imp = Implementation::new(f).with_label(signature);
        self.implementation(signature, imp)
    }

    /// Map a signature to an existing implementation.
    pub fn implementation(self, signature: &str, imp: Implementation) -> Self {
        self.entry(signature, Entry::Method(imp))
    }

    /// Map a signature to another entry.
    pub fn alias(self, signature: &str, target: &str) -> Self {
        self.entry(signature, Entry::Alias(target.to_string()))
    }

    /// Add a list-form overload keyed by its `arguments` text.
    pub fn overload(self, overload: Overload) -> Self {
        let key = overload.arguments.clone();
        self.entry(&key, Entry::Overload(overload))
    }

    /// Insert an entry. Re-using a signature replaces the entry in place,
    /// keeping its original declaration position.
    pub fn entry(mut self, signature: &str, entry: Entry) -> Self {
        self.insert(signature, entry);
        self
    }

    pub fn insert(&mut self, signature: &str, entry: Entry) -> Option<Entry> {
        self.entries.insert(signature.to_string(), entry)
    }

    pub fn get(&self, signature: &str) -> Option<&Entry> {
        self.entries.get(signature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

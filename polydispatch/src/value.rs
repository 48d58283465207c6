//! Runtime values routed by the dispatch engine.
//!
//! Dispatch happens over dynamically shaped arguments, so callers hand the
//! engine [`Value`]s rather than statically typed Rust arguments. Host values
//! that the classic model would probe by duck typing (DOM nodes, events,
//! user classes) are modelled explicitly as [`HostObject`]s that declare the
//! properties and methods they carry.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::bind::Implementation;

/// An insertion-ordered, string-keyed record.
pub type Record = IndexMap<String, Value>;

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    /// A regular expression, kept as its source pattern.
    RegExp(String),
    Function(Implementation),
    Array(Vec<Value>),
    /// A call's argument list captured as a value.
    Arguments(Vec<Value>),
    Object(Record),
    Host(HostObject),
}

/// The constructor identity of a value.
///
/// Exact-identity classifier rules match against this, which keeps the common
/// cases off the predicate path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constructor {
    String,
    Number,
    Boolean,
    Date,
    RegExp,
    Function,
    Array,
    Arguments,
    Object,
    /// A host object's constructor, by name.
    Named(Arc<str>),
}

impl Constructor {
    /// The constructor of host objects created with `name`.
    pub fn named(name: impl AsRef<str>) -> Self {
        Constructor::Named(Arc::from(name.as_ref()))
    }
}

impl Value {
    /// Build an [`Value::Object`] from key/value pairs.
    pub fn object<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build an [`Value::Array`] from anything convertible to values.
    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// The `typeof`-style runtime name of this value.
    ///
    /// This is what a value classifies as when no classifier rule matches.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Date(_)
            | Value::RegExp(_)
            | Value::Array(_)
            | Value::Arguments(_)
            | Value::Object(_)
            | Value::Host(_) => "object",
        }
    }

    /// The constructor identity, if the value has one.
    pub fn constructor(&self) -> Option<Constructor> {
        let cons = match self {
            Value::Undefined | Value::Null => return None,
            Value::Bool(_) => Constructor::Boolean,
            Value::Number(_) => Constructor::Number,
            Value::String(_) => Constructor::String,
            Value::Date(_) => Constructor::Date,
            Value::RegExp(_) => Constructor::RegExp,
            Value::Function(_) => Constructor::Function,
            Value::Array(_) => Constructor::Array,
            Value::Arguments(_) => Constructor::Arguments,
            Value::Object(_) => Constructor::Object,
            Value::Host(host) => Constructor::Named(host.constructor.clone()),
        };
        Some(cons)
    }

    /// Dynamic-language truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The elements of an array-like value, if it is one.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::Arguments(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a named property on records and host objects.
    pub fn property(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(record) => record.get(name),
            Value::Host(host) => host.property(name),
            _ => None,
        }
    }

    /// Whether the value responds to a method of the given name.
    pub fn responds_to(&self, method: &str) -> bool {
        match self {
            Value::Host(host) => host.responds_to(method),
            Value::Object(record) => matches!(record.get(method), Some(Value::Function(_))),
            _ => false,
        }
    }
}

/// A host-provided value with explicitly declared capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct HostObject {
    constructor: Arc<str>,
    properties: Record,
    methods: BTreeSet<String>,
    type_tag: Option<String>,
}

impl HostObject {
    /// Create a host object built by the named constructor.
    pub fn new(constructor: impl AsRef<str>) -> Self {
        Self {
            constructor: Arc::from(constructor.as_ref()),
            properties: Record::new(),
            methods: BTreeSet::new(),
            type_tag: None,
        }
    }

    /// Attach a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Declare a method the object responds to.
    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.methods.insert(name.into());
        self
    }

    /// Make the object report its own type token, bypassing classifier rules.
    pub fn with_type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn constructor(&self) -> &str {
        &self.constructor
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn responds_to(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

impl From<HostObject> for Value {
    fn from(host: HostObject) -> Self {
        Value::Host(host)
    }
}

impl From<Implementation> for Value {
    fn from(imp: Implementation) -> Self {
        Value::Function(imp)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(ms) => write!(f, "Date({ms})"),
            Value::RegExp(pattern) => write!(f, "/{pattern}/"),
            Value::Function(imp) => write!(f, "<function {}>", imp.label()),
            Value::Array(items) | Value::Arguments(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(record) => {
                write!(f, "{{")?;
                for (i, (key, value)) in record.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Host(host) => write!(f, "<{}>", host.constructor()),
        }
    }
}

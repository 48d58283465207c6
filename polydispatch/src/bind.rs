//! Implementations and the parameter binder.
//!
//! An [`Implementation`] is an invocable body plus metadata. When a signature
//! names its parameters, [`bind`] wraps the body so it receives one
//! [`CallArgs::Named`] record instead of positional values.

use std::fmt;
use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};
use crate::value::{Record, Value};

type ImplFn = dyn Fn(CallArgs) -> DispatchResult<Value> + Send + Sync;

/// Arguments as delivered to an implementation body.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// Unnamed signatures receive the supplied values in order.
    Positional(Vec<Value>),
    /// Named signatures receive a record keyed by parameter name.
    Named(Record),
}

impl CallArgs {
    /// Look up a named argument. Always `None` for positional calls.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            CallArgs::Positional(_) => None,
            CallArgs::Named(record) => record.get(name),
        }
    }

    /// The argument at `index`, in supply order.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            CallArgs::Positional(values) => values.get(index),
            CallArgs::Named(record) => record.get_index(index).map(|(_, v)| v),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CallArgs::Positional(values) => values.len(),
            CallArgs::Named(record) => record.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The argument values in supply order, dropping any names.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            CallArgs::Positional(values) => values,
            CallArgs::Named(record) => record.into_values().collect(),
        }
    }

    /// The arguments as a single value: an arguments list or a record.
    pub fn into_value(self) -> Value {
        match self {
            CallArgs::Positional(values) => Value::Arguments(values),
            CallArgs::Named(record) => Value::Object(record),
        }
    }
}

/// An invocable implementation with a diagnostic label.
#[derive(Clone)]
pub struct Implementation {
    label: Arc<str>,
    func: Arc<ImplFn>,
}

impl Implementation {
    /// Wrap an infallible body.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(CallArgs) -> Value + Send + Sync + 'static,
    {
        Self::fallible(move |args| Ok(f(args)))
    }

    /// Wrap a body that may fail.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(CallArgs) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Self {
            label: Arc::from("anonymous"),
            func: Arc::new(f),
        }
    }

    /// An implementation that always returns a clone of `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| value.clone())
    }

    /// Replace the diagnostic label.
    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = Arc::from(label.as_ref());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn invoke(&self, args: CallArgs) -> DispatchResult<Value> {
        (self.func)(args)
    }

    /// Invoke with positional arguments.
    pub fn call(&self, args: Vec<Value>) -> DispatchResult<Value> {
        self.invoke(CallArgs::Positional(args))
    }

    /// Whether both handles share the same body.
    pub fn ptr_eq(&self, other: &Implementation) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Implementation {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Bind parameter names onto an implementation.
///
/// With no names the implementation is returned unchanged and keeps the
/// positional calling convention. Otherwise the wrapper zips `names` with the
/// supplied values; names beyond the supplied arguments stay absent from the
/// record, and supplying more arguments than names is a binding error.
pub fn bind(implementation: Implementation, names: &[String]) -> Implementation {
    if names.is_empty() {
        return implementation;
    }

    let names: Arc<[String]> = names.into();
    let label = implementation.label.clone();
    let func = move |args: CallArgs| {
        let values = args.into_values();
        if values.len() > names.len() {
            return Err(DispatchError::Binding {
                supplied: values.len(),
                names: names.to_vec(),
            });
        }
        let record: Record = names.iter().cloned().zip(values).collect();
        implementation.invoke(CallArgs::Named(record))
    };

    Implementation {
        label,
        func: Arc::new(func),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn echo() -> Implementation {
        Implementation::new(CallArgs::into_value).with_label("echo")
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unbound_is_pass_through() {
        let imp = echo();
        let bound = bind(imp.clone(), &[]);
        assert!(bound.ptr_eq(&imp));
        assert_eq!(
            bound.call(vec![Value::from(1)]).unwrap(),
            Value::Arguments(vec![Value::from(1)])
        );
    }

    #[test]
    fn test_bound_builds_record() {
        let bound = bind(echo(), &names(&["list", "options"]));
        let result = bound.call(vec![Value::array([1, 2, 3])]).unwrap();
        assert_eq!(result, Value::object([("list", Value::array([1, 2, 3]))]));
        assert_eq!(bound.label(), "echo");
    }

    #[test]
    fn test_too_many_arguments() {
        let bound = bind(echo(), &names(&["list"]));
        let err = bound
            .call(vec![Value::from(1), Value::from(2)])
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Binding {
                supplied: 2,
                names: names(&["list"]),
            }
        );
    }

    #[test]
    fn test_call_args_accessors() {
        let args = CallArgs::Named(
            [("a".to_string(), Value::from(1)), ("b".to_string(), Value::from("x"))]
                .into_iter()
                .collect(),
        );
        assert_eq!(args.get("b"), Some(&Value::from("x")));
        assert_eq!(args.at(0), Some(&Value::from(1)));
        assert_eq!(args.len(), 2);
        assert_eq!(CallArgs::Positional(vec![]).get("a"), None);
    }
}

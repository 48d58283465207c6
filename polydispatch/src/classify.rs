//! Runtime type classification.
//!
//! A [`Classifier`] maps a [`Value`] to a type token such as `array` or
//! `number`. Rules are evaluated in order and the first match wins:
//! exact constructor-identity rules come first, predicate rules after.
//! A value matching no rule classifies as its [`Value::type_of`] name.

use std::fmt;
use std::sync::Arc;

use crate::signature::TypeKey;
use crate::value::{Constructor, Value};

/// A predicate receiving `(value, type_of, constructor)`.
pub type Predicate = dyn Fn(&Value, &str, Option<&Constructor>) -> bool + Send + Sync;

/// One classification rule.
#[derive(Clone)]
pub enum ClassifierRule {
    /// Matches values built by exactly this constructor.
    Constructor { token: String, constructor: Constructor },
    /// Matches values the predicate accepts.
    Predicate { token: String, test: Arc<Predicate> },
}

impl ClassifierRule {
    pub fn constructor(token: impl Into<String>, constructor: Constructor) -> Self {
        ClassifierRule::Constructor {
            token: token.into(),
            constructor,
        }
    }

    pub fn predicate<F>(token: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value, &str, Option<&Constructor>) -> bool + Send + Sync + 'static,
    {
        ClassifierRule::Predicate {
            token: token.into(),
            test: Arc::new(test),
        }
    }

    /// The token this rule assigns.
    pub fn token(&self) -> &str {
        match self {
            ClassifierRule::Constructor { token, .. } | ClassifierRule::Predicate { token, .. } => {
                token
            }
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, ClassifierRule::Constructor { .. })
    }

    fn matches(&self, value: &Value, type_of: &str, constructor: Option<&Constructor>) -> bool {
        match self {
            ClassifierRule::Constructor { constructor: want, .. } => constructor == Some(want),
            ClassifierRule::Predicate { test, .. } => test(value, type_of, constructor),
        }
    }
}

impl fmt::Debug for ClassifierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierRule::Constructor { token, constructor } => f
                .debug_struct("Constructor")
                .field("token", token)
                .field("constructor", constructor)
                .finish(),
            ClassifierRule::Predicate { token, .. } => f
                .debug_struct("Predicate")
                .field("token", token)
                .finish_non_exhaustive(),
        }
    }
}

/// An ordered, first-match-wins rule list.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassifierRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl Classifier {
    /// A classifier with no rules: everything classifies as its `type_of`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in token set.
    pub fn standard() -> Self {
        let rules = vec![
            ClassifierRule::constructor("string", Constructor::String),
            ClassifierRule::constructor("number", Constructor::Number),
            ClassifierRule::constructor("boolean", Constructor::Boolean),
            ClassifierRule::constructor("date", Constructor::Date),
            ClassifierRule::constructor("regexp", Constructor::RegExp),
            ClassifierRule::predicate("function", |_, t, c| {
                c == Some(&Constructor::Function) || t == "function"
            }),
            ClassifierRule::predicate("callable", |v, _, _| {
                v.responds_to("call") && v.responds_to("apply")
            }),
            ClassifierRule::predicate("array", |v, _, c| {
                matches!(c, Some(Constructor::Array | Constructor::Arguments))
                    || (v.responds_to("join") && v.responds_to("slice") && v.responds_to("unshift"))
                    || (truthy(v, "0") && v.property("length").is_some())
            }),
            ClassifierRule::predicate("event", |v, _, _| {
                truthy(v, "type") && (truthy(v, "target") || truthy(v, "srcElement"))
            }),
            ClassifierRule::predicate("element", |v, _, _| v.responds_to("getElementsByTagName")),
            ClassifierRule::predicate("document", |v, _, _| v.responds_to("getElementById")),
            ClassifierRule::predicate("window", |v, _, _| {
                truthy(v, "location") && truthy(v, "document")
            }),
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Add a rule.
    ///
    /// Constructor rules go after the last existing constructor rule;
    /// predicate rules go last.
    pub fn register(&mut self, rule: ClassifierRule) -> &mut Self {
        if rule.is_constructor() {
            let at = self
                .rules
                .iter()
                .rposition(ClassifierRule::is_constructor)
                .map_or(0, |i| i + 1);
            self.rules.insert(at, rule);
        } else {
            self.rules.push(rule);
        }
        self
    }

    /// Add a rule ahead of every existing rule.
    pub fn register_front(&mut self, rule: ClassifierRule) -> &mut Self {
        self.rules.insert(0, rule);
        self
    }

    /// Builder form of [`Classifier::register`].
    pub fn with_rule(mut self, rule: ClassifierRule) -> Self {
        self.register(rule);
        self
    }

    /// Classify a single value at depth 0.
    pub fn classify(&self, value: &Value) -> String {
        if let Value::Host(host) = value {
            if let Some(tag) = host.type_tag() {
                return tag.to_string();
            }
        }
        if matches!(value, Value::Undefined) {
            return "undefined".to_string();
        }

        let type_of = value.type_of();
        let constructor = value.constructor();
        self.rules
            .iter()
            .find(|rule| rule.matches(value, type_of, constructor.as_ref()))
            .map_or_else(|| type_of.to_string(), |rule| rule.token().to_string())
    }

    /// Describe a value, recursing into array-likes while `depth > 0`.
    ///
    /// `describe(&[1, "a"], 1)` is `[number, string]`; at depth 0 it is
    /// just `array`.
    pub fn describe(&self, value: &Value, depth: usize) -> String {
        if depth > 0 {
            if let Some(items) = value.as_elements() {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| self.describe(item, depth - 1))
                    .collect();
                return format!("[{}]", parts.join(", "));
            }
        }
        self.classify(value)
    }

    /// The type key of a positional argument list.
    pub fn type_key(&self, args: &[Value]) -> TypeKey {
        args.iter().map(|arg| self.classify(arg)).collect()
    }

    /// Comparison mode: whether the value classifies as any of `comparisons`.
    pub fn is_type(&self, value: &Value, comparisons: &[&str]) -> bool {
        let token = self.classify(value);
        comparisons.iter().any(|c| *c == token)
    }
}

fn truthy(value: &Value, property: &str) -> bool {
    value.property(property).map_or(false, Value::is_truthy)
}

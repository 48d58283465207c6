//! Description files.
//!
//! ```toml
//! [engine]
//! collision_policy = "first-declared-wins"
//!
//! [[entry]]
//! signature = "[array:list] [object:options]?"
//! method = "concat"
//!
//! [[entry]]
//! signature = "[number:count, array:items]"
//! method = "repeat"
//! defaults = [0, []]
//!
//! [[entry]]
//! signature = "[string]"
//! alias = "[array]"
//! ```
//!
//! A `method` entry runs an echo implementation that returns its label and
//! the arguments it was bound with.

use std::fs;
use std::path::Path;

use polydispatch::{Description, EngineConfig, Entry, Implementation, Overload, Value};
use serde::Deserialize;
use thiserror::Error;

/// Errors loading a description file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("entry `{0}` must set exactly one of `method` or `alias`")]
    Target(String),

    #[error("alias entry `{0}` cannot carry defaults")]
    AliasDefaults(String),
}

/// A parsed description file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptionFile {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default, rename = "entry")]
    pub entries: Vec<EntrySpec>,
}

/// One `[[entry]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrySpec {
    pub signature: String,
    pub method: Option<String>,
    pub alias: Option<String>,
    #[serde(default)]
    pub defaults: Vec<serde_json::Value>,
}

impl DescriptionFile {
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, FileError> {
        Ok(toml::from_str(text)?)
    }

    /// Build the description, in file order.
    pub fn description(&self) -> Result<Description, FileError> {
        let mut desc = Description::new();
        for spec in &self.entries {
            desc.insert(&spec.signature, spec.entry()?);
        }
        Ok(desc)
    }
}

impl EntrySpec {
    fn entry(&self) -> Result<Entry, FileError> {
        match (&self.method, &self.alias) {
            (Some(label), None) => {
                let method = echo(label);
                if self.defaults.is_empty() {
                    return Ok(Entry::Method(method));
                }
                let defaults = self.defaults.iter().cloned().map(Value::from).collect();
                Ok(Entry::Overload(
                    Overload::new(self.signature.clone(), method).with_defaults(defaults),
                ))
            }
            (None, Some(target)) => {
                if !self.defaults.is_empty() {
                    return Err(FileError::AliasDefaults(self.signature.clone()));
                }
                Ok(Entry::Alias(target.clone()))
            }
            _ => Err(FileError::Target(self.signature.clone())),
        }
    }
}

fn echo(label: &str) -> Implementation {
    let name = Value::from(label);
    Implementation::new(move |args| Value::array([name.clone(), args.into_value()])).with_label(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydispatch::CollisionPolicy;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[engine]
collision_policy = "first-declared-wins"

[[entry]]
signature = "[array:list] [object:options]?"
method = "concat"

[[entry]]
signature = "[number:count, array:items]"
method = "repeat"
defaults = [0, []]

[[entry]]
signature = "[string]"
alias = "[array]"
"#;

    #[test]
    fn test_load_sample() {
        let file = DescriptionFile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(file.engine.collision_policy, CollisionPolicy::FirstDeclaredWins);
        assert_eq!(file.engine.max_alias_hops, 4);

        let desc = file.description().unwrap();
        let keys: Vec<_> = desc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["[array:list] [object:options]?", "[number:count, array:items]", "[string]"]);
        match desc.get("[number:count, array:items]") {
            Some(Entry::Overload(o)) => {
                assert_eq!(o.defaults, vec![Value::from(0), Value::array(Vec::<Value>::new())])
            }
            other => panic!("Expected overload entry, got {:?}", other),
        }
    }

    #[test]
    fn test_echo_implementation() {
        let file = DescriptionFile::from_toml_str(SAMPLE).unwrap();
        let resolver = polydispatch::compile(&file.description().unwrap()).unwrap();
        let result = resolver.call(vec![Value::from("s")]).unwrap();
        assert_eq!(
            result,
            Value::array([Value::from("concat"), Value::object([("list", "s")])])
        );
    }

    #[test]
    fn test_target_must_be_exclusive() {
        let both = "[[entry]]\nsignature = \"[a]\"\nmethod = \"x\"\nalias = \"[b]\"\n";
        let file = DescriptionFile::from_toml_str(both).unwrap();
        assert!(matches!(file.description(), Err(FileError::Target(_))));

        let neither = "[[entry]]\nsignature = \"[a]\"\n";
        let file = DescriptionFile::from_toml_str(neither).unwrap();
        assert!(matches!(file.description(), Err(FileError::Target(_))));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(DescriptionFile::from_toml_str("[[entry]]\nsignatures = \"[a]\"\n").is_err());
    }
}

//! Compilation stages.
//!
//! Every description entry is parsed into a [`PlannedEntry`], then handed
//! through the engine's ordered stage list. Each engine owns its own list;
//! there is no shared registry to append to. The default list binds names,
//! expands optional groups, then expands alternatives. After the last stage,
//! every shape must be concrete.

use rustc_hash::FxHashMap;

use crate::bind::Implementation;
use crate::error::{CompileError, CompileResult};
use crate::expand::{self, Shape};
use crate::signature::{Signature, TypeToken};
use crate::value::Value;

/// What a planned entry runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Method(Implementation),
    Alias(String),
}

/// One description entry on its way to the dispatch table.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    /// Declaration position in the description.
    pub order: usize,
    /// The description key, verbatim.
    pub source: String,
    pub signature: Signature,
    pub target: Target,
    pub defaults: Vec<Value>,
    /// Names for the binder. Empty keeps the positional convention.
    pub param_names: Vec<String>,
    /// Shapes that will become table keys.
    pub shapes: Vec<Shape>,
}

impl PlannedEntry {
    /// A freshly parsed entry: one shape covering the whole signature.
    pub fn new(
        order: usize,
        source: impl Into<String>,
        signature: Signature,
        target: Target,
        defaults: Vec<Value>,
    ) -> Self {
        let shapes = vec![expand::full_shape(&signature)];
        Self {
            order,
            source: source.into(),
            signature,
            target,
            defaults,
            param_names: Vec::new(),
            shapes,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.target, Target::Alias(_))
    }
}

/// A compilation stage.
pub trait Stage: Send + Sync {
    /// Stable name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Rewrite the planned entries in place.
    fn run(&self, entries: &mut [PlannedEntry]) -> CompileResult<()>;
}

/// The stage list used when an engine is built without one.
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(BindNames),
        Box::new(ExpandOptionalGroups),
        Box::new(ExpandAlternatives),
    ]
}

/// Resolve binder names: a `>` projection, else inline `:binding`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindNames;

impl Stage for BindNames {
    fn name(&self) -> &'static str {
        "bind-names"
    }

    fn run(&self, entries: &mut [PlannedEntry]) -> CompileResult<()> {
        for entry in entries {
            entry.param_names = entry.signature.param_names();
        }
        Ok(())
    }
}

/// Replace each entry's shapes with one shape per accepted prefix length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandOptionalGroups;

impl Stage for ExpandOptionalGroups {
    fn name(&self) -> &'static str {
        "expand-optional-groups"
    }

    fn run(&self, entries: &mut [PlannedEntry]) -> CompileResult<()> {
        for entry in entries {
            entry.shapes = expand::optional_prefixes(&entry.signature);
        }
        Ok(())
    }
}

/// Replace each shape holding alternatives with its concrete combinations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandAlternatives;

impl Stage for ExpandAlternatives {
    fn name(&self) -> &'static str {
        "expand-alternatives"
    }

    fn run(&self, entries: &mut [PlannedEntry]) -> CompileResult<()> {
        for entry in entries {
            entry.shapes = entry
                .shapes
                .iter()
                .flat_map(|shape| expand::alternative_keys(shape))
                .map(|key| key.tokens().iter().cloned().map(TypeToken::Single).collect())
                .collect();
        }
        Ok(())
    }
}

/// Rewrite type tokens through a synonym table, e.g. `list` to `array`.
///
/// Rewrites the signature and every shape in place, so the result is the
/// same wherever the stage sits in the list. A synonym whose target is itself
/// rewritten is rejected.
#[derive(Debug, Clone, Default)]
pub struct TokenSynonyms {
    synonyms: FxHashMap<String, String>,
}

impl TokenSynonyms {
    pub fn new<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            synonyms: pairs
                .into_iter()
                .map(|(a, b)| (a.into(), b.into()))
                .collect(),
        }
    }

    fn rewrite(&self, token: &mut String) {
        if let Some(canonical) = self.synonyms.get(token.as_str()) {
            token.clone_from(canonical);
        }
    }

    fn rewrite_type(&self, ty: &mut TypeToken) {
        match ty {
            TypeToken::Single(token) => self.rewrite(token),
            TypeToken::Alternatives(tokens) => {
                tokens.iter_mut().for_each(|t| self.rewrite(t));
                let mut seen = Vec::with_capacity(tokens.len());
                tokens.retain(|t| {
                    let fresh = !seen.contains(t);
                    if fresh {
                        seen.push(t.clone());
                    }
                    fresh
                });
                let merged = match tokens.as_slice() {
                    [only] => Some(only.clone()),
                    _ => None,
                };
                if let Some(only) = merged {
                    *ty = TypeToken::Single(only);
                }
            }
        }
    }
}

impl Stage for TokenSynonyms {
    fn name(&self) -> &'static str {
        "token-synonyms"
    }

    fn run(&self, entries: &mut [PlannedEntry]) -> CompileResult<()> {
        if let Some((from, to)) = self
            .synonyms
            .iter()
            .find(|(from, to)| from != to && self.synonyms.contains_key(to.as_str()))
        {
            return Err(CompileError::Stage {
                stage: self.name(),
                message: format!("synonym `{from}` maps to `{to}`, which is itself rewritten"),
            });
        }

        for entry in entries {
            for group in &mut entry.signature.groups {
                for param in &mut group.params {
                    self.rewrite_type(&mut param.ty);
                }
            }
            for shape in &mut entry.shapes {
                shape.iter_mut().for_each(|ty| self.rewrite_type(ty));
            }
        }
        Ok(())
    }
}

//! The dispatch table and its builder.
//!
//! Building turns planned entries into an immutable map from
//! [`CanonicalKey`] to [`ResolvedEntry`]:
//!
//! 1. Insert every concrete key, reconciling collisions between entries with
//!    the configured [`CollisionPolicy`].
//! 2. Chase alias chains to their terminal implementation, bounded by the
//!    hop limit, with cycle and missing-target detection.
//! 3. Bind each terminal implementation with its parameter names and
//!    pre-classify its defaults.
//!
//! There is no mutation API. A changed table comes from recompiling.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::{debug, warn};

use crate::bind::{bind, Implementation};
use crate::classify::Classifier;
use crate::config::{CollisionPolicy, EngineConfig};
use crate::error::{AliasResolutionError, CompileError, CompileResult};
use crate::expand::{self, concrete_key, render_shape};
use crate::pipeline::{PlannedEntry, Target};
use crate::signature::{CanonicalKey, Signature};
use crate::value::Value;

/// Index of a terminal entry within a [`DispatchTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

/// A terminal implementation, ready to invoke.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub id: EntryId,
    /// Description key of the entry that supplied the implementation.
    pub source: String,
    /// The implementation, already wrapped by the binder.
    pub implementation: Implementation,
    /// Binder names, when the signature declared any.
    pub param_names: Option<Vec<String>>,
    /// Padding values for missing trailing arguments.
    pub defaults: Vec<Value>,
    /// Type tokens of `defaults`, classified once at build time.
    pub default_tokens: Vec<String>,
}

/// Where a key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySlot {
    /// The terminal entry the key dispatches to.
    pub entry: EntryId,
    /// Description key of the entry that declared the key (maybe an alias).
    pub declared_by: String,
}

/// A key claimed by two entries, and how it was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: CanonicalKey,
    /// The entry that owns the key.
    pub kept: String,
    /// The entry whose claim was dropped.
    pub dropped: String,
}

/// An immutable map from canonical key to resolved implementation.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    keys: IndexMap<CanonicalKey, KeySlot, FxBuildHasher>,
    entries: Vec<ResolvedEntry>,
    padded: Vec<EntryId>,
    collisions: Vec<Collision>,
}

impl DispatchTable {
    /// Look up the entry a key dispatches to.
    pub fn lookup(&self, key: &CanonicalKey) -> Option<&ResolvedEntry> {
        self.keys.get(key).map(|slot| &self.entries[slot.entry.0])
    }

    /// Look up by tokens, e.g. `table.get(&["array", "object"])`.
    pub fn get(&self, tokens: &[&str]) -> Option<&ResolvedEntry> {
        let key: CanonicalKey = tokens.iter().copied().collect();
        self.lookup(&key)
    }

    pub fn contains_key(&self, key: &CanonicalKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn slot(&self, key: &CanonicalKey) -> Option<&KeySlot> {
        self.keys.get(key)
    }

    pub fn entry(&self, id: EntryId) -> Option<&ResolvedEntry> {
        self.entries.get(id.0)
    }

    /// Keys in table order: declaration order, then expansion order.
    pub fn keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.keys.keys()
    }

    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    /// Entries declaring defaults, in declaration order.
    pub fn padded_entries(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.padded.iter().map(|id| &self.entries[id.0])
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// One `key => source` line per key; aliases show `-> terminal`.
    pub fn render(&self) -> String {
        self.keys
            .iter()
            .map(|(key, slot)| {
                let terminal = &self.entries[slot.entry.0].source;
                if *terminal == slot.declared_by {
                    format!("{key} => {terminal}")
                } else {
                    format!("{key} => {} -> {terminal}", slot.declared_by)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds a [`DispatchTable`] from planned entries.
pub struct TableBuilder<'a> {
    classifier: &'a Classifier,
    config: &'a EngineConfig,
}

impl<'a> TableBuilder<'a> {
    pub fn new(classifier: &'a Classifier, config: &'a EngineConfig) -> Self {
        Self { classifier, config }
    }

    pub fn build(&self, planned: Vec<PlannedEntry>) -> CompileResult<DispatchTable> {
        let (owners, collisions) = self.claim_keys(&planned)?;
        let terminals = self.resolve_aliases(&planned, &owners)?;

        // Bind every terminal entry once.
        let mut ids: FxHashMap<usize, EntryId> = FxHashMap::default();
        let mut entries = Vec::new();
        let mut padded = Vec::new();
        for (index, entry) in planned.iter().enumerate() {
            let Target::Method(imp) = &entry.target else {
                continue;
            };
            let id = EntryId(entries.len());
            ids.insert(index, id);
            if !entry.defaults.is_empty() {
                padded.push(id);
            }
            entries.push(ResolvedEntry {
                id,
                source: entry.source.clone(),
                implementation: bind(imp.clone(), &entry.param_names),
                param_names: (!entry.param_names.is_empty()).then(|| entry.param_names.clone()),
                defaults: entry.defaults.clone(),
                default_tokens: entry
                    .defaults
                    .iter()
                    .map(|v| self.classifier.classify(v))
                    .collect(),
            });
        }

        let keys: IndexMap<CanonicalKey, KeySlot, FxBuildHasher> = owners
            .into_iter()
            .map(|(key, owner)| {
                let slot = KeySlot {
                    entry: ids[&terminals[owner]],
                    declared_by: planned[owner].source.clone(),
                };
                (key, slot)
            })
            .collect();

        debug!(
            entries = planned.len(),
            keys = keys.len(),
            collisions = collisions.len(),
            "built dispatch table"
        );

        Ok(DispatchTable {
            keys,
            entries,
            padded,
            collisions,
        })
    }

    /// Assign every concrete key to the planned entry that owns it.
    fn claim_keys(
        &self,
        planned: &[PlannedEntry],
    ) -> CompileResult<(IndexMap<CanonicalKey, usize, FxBuildHasher>, Vec<Collision>)> {
        let mut owners: IndexMap<CanonicalKey, usize, FxBuildHasher> = IndexMap::default();
        let mut collisions = Vec::new();

        for (index, entry) in planned.iter().enumerate() {
            for shape in &entry.shapes {
                let key = concrete_key(shape).ok_or_else(|| CompileError::UnexpandedShape {
                    signature: entry.source.clone(),
                    shape: render_shape(shape),
                })?;

                let Some(&previous) = owners.get(&key) else {
                    owners.insert(key, index);
                    continue;
                };
                if previous == index {
                    continue;
                }

                let (kept, dropped) = match self.config.collision_policy {
                    CollisionPolicy::LastDeclaredWins => {
                        owners.insert(key.clone(), index);
                        (index, previous)
                    }
                    CollisionPolicy::FirstDeclaredWins => (previous, index),
                    CollisionPolicy::Reject => {
                        return Err(CompileError::Collision {
                            key,
                            first: planned[previous].source.clone(),
                            second: entry.source.clone(),
                        });
                    }
                };
                warn!(
                    key = %key,
                    kept = %planned[kept].source,
                    dropped = %planned[dropped].source,
                    "canonical key collision"
                );
                collisions.push(Collision {
                    key,
                    kept: planned[kept].source.clone(),
                    dropped: planned[dropped].source.clone(),
                });
            }
        }

        Ok((owners, collisions))
    }

    /// Map each planned entry to the index of its terminal method entry.
    fn resolve_aliases(
        &self,
        planned: &[PlannedEntry],
        owners: &IndexMap<CanonicalKey, usize, FxBuildHasher>,
    ) -> CompileResult<Vec<usize>> {
        let by_source: FxHashMap<&str, usize> = planned
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.source.as_str(), index))
            .collect();

        let find = |target: &str| -> Option<usize> {
            if let Some(&index) = by_source.get(target) {
                return Some(index);
            }
            // Fall back to the canonical key the target text spells.
            let signature = Signature::parse(target).ok()?;
            match expand::expand(&signature).as_slice() {
                [key] => owners.get(key).copied(),
                _ => None,
            }
        };

        planned
            .iter()
            .enumerate()
            .map(|(start, _)| self.chase(planned, start, &find))
            .collect()
    }

    fn chase(
        &self,
        planned: &[PlannedEntry],
        start: usize,
        find: &dyn Fn(&str) -> Option<usize>,
    ) -> CompileResult<usize> {
        let limit = self.config.max_alias_hops;
        let mut current = start;
        let mut visited = vec![start];

        loop {
            let alias = match &planned[current].target {
                Target::Method(_) => return Ok(current),
                Target::Alias(target) => target,
            };

            if visited.len() > limit {
                return Err(AliasResolutionError::HopLimitExceeded {
                    alias: planned[start].source.clone(),
                    limit,
                }
                .into());
            }

            let next = find(alias).ok_or_else(|| AliasResolutionError::MissingTarget {
                alias: planned[current].source.clone(),
                target: alias.clone(),
            })?;

            if visited.contains(&next) {
                let mut cycle: Vec<String> =
                    visited.iter().map(|&i| planned[i].source.clone()).collect();
                cycle.push(planned[next].source.clone());
                return Err(AliasResolutionError::Cycle {
                    alias: planned[start].source.clone(),
                    cycle,
                }
                .into());
            }

            visited.push(next);
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::default_stages;
    use crate::signature::parse;
    use pretty_assertions::assert_eq;

    fn plan(entries: &[(&str, Target)]) -> Vec<PlannedEntry> {
        let mut planned: Vec<PlannedEntry> = entries
            .iter()
            .enumerate()
            .map(|(order, (source, target))| {
                PlannedEntry::new(order, *source, parse(source).unwrap(), target.clone(), Vec::new())
            })
            .collect();
        for stage in default_stages() {
            stage.run(&mut planned).unwrap();
        }
        planned
    }

    fn method(label: &str) -> Target {
        Target::Method(Implementation::constant(Value::from(label)).with_label(label))
    }

    fn alias(target: &str) -> Target {
        Target::Alias(target.to_string())
    }

    fn build(entries: &[(&str, Target)], config: &EngineConfig) -> CompileResult<DispatchTable> {
        TableBuilder::new(&Classifier::standard(), config).build(plan(entries))
    }

    #[test]
    fn test_keys_share_one_entry() {
        let table = build(&[("[array:list] [object:options]?", method("f"))], &EngineConfig::default()).unwrap();
        assert_eq!(table.len(), 2);
        let short = table.get(&["array"]).unwrap();
        let long = table.get(&["array", "object"]).unwrap();
        assert_eq!(short.id, long.id);
        assert_eq!(short.param_names, Some(vec!["list".to_string(), "options".to_string()]));
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn test_last_declared_wins() {
        let table = build(
            &[("[object, string|array]", method("first")), ("[object, array]", method("second"))],
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(table.get(&["object", "array"]).unwrap().source, "[object, array]");
        assert_eq!(table.get(&["object", "string"]).unwrap().source, "[object, string|array]");
        assert_eq!(
            table.collisions(),
            &[Collision {
                key: ["object", "array"].into_iter().collect(),
                kept: "[object, array]".to_string(),
                dropped: "[object, string|array]".to_string(),
            }]
        );
    }

    #[test]
    fn test_first_declared_wins() {
        let config = EngineConfig::new().with_collision_policy(CollisionPolicy::FirstDeclaredWins);
        let table = build(
            &[("[object, string|array]", method("first")), ("[object, array]", method("second"))],
            &config,
        )
        .unwrap();
        assert_eq!(table.get(&["object", "array"]).unwrap().source, "[object, string|array]");
        assert_eq!(table.collisions().len(), 1);
    }

    #[test]
    fn test_reject_collisions() {
        let config = EngineConfig::new().with_collision_policy(CollisionPolicy::Reject);
        let err = build(
            &[("[array] [object]?", method("first")), ("[array, object]", method("second"))],
            &config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::Collision {
                key: ["array", "object"].into_iter().collect(),
                first: "[array] [object]?".to_string(),
                second: "[array, object]".to_string(),
            }
        );
    }

    #[test]
    fn test_alias_by_source_and_by_canonical_key() {
        let table = build(
            &[
                ("[array:list] [object:options]?", method("f")),
                ("[string]", alias("[array]")),
                ("[number]", alias("[array:list] [object:options]?")),
            ],
            &EngineConfig::default(),
        )
        .unwrap();
        let target = table.get(&["array"]).unwrap().id;
        assert_eq!(table.get(&["string"]).unwrap().id, target);
        assert_eq!(table.get(&["number"]).unwrap().id, target);
        let key: CanonicalKey = ["string"].into_iter().collect();
        assert_eq!(table.slot(&key).unwrap().declared_by, "[string]");
    }

    #[test]
    fn test_missing_alias_target() {
        let err = build(&[("[string]", alias("[nothing]"))], &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::Alias(AliasResolutionError::MissingTarget {
                alias: "[string]".to_string(),
                target: "[nothing]".to_string(),
            })
        );
    }

    #[test]
    fn test_alias_cycle() {
        let err = build(
            &[("[a]", alias("[b]")), ("[b]", alias("[a]"))],
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::Alias(AliasResolutionError::Cycle {
                alias: "[a]".to_string(),
                cycle: vec!["[a]".to_string(), "[b]".to_string(), "[a]".to_string()],
            })
        );
    }

    #[test]
    fn test_unexpanded_shape_is_an_error() {
        let planned = vec![PlannedEntry::new(
            0,
            "[string|array]",
            parse("[string|array]").unwrap(),
            method("f"),
            Vec::new(),
        )];
        let err = TableBuilder::new(&Classifier::standard(), &EngineConfig::default())
            .build(planned)
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnexpandedShape {
                signature: "[string|array]".to_string(),
                shape: "[string|array]".to_string(),
            }
        );
    }

    #[test]
    fn test_default_tokens_are_classified() {
        let mut planned = plan(&[("[number, array]", method("f"))]);
        planned[0].defaults = vec![Value::from(0), Value::array(Vec::<Value>::new())];
        let table = TableBuilder::new(&Classifier::standard(), &EngineConfig::default())
            .build(planned)
            .unwrap();
        let entry = table.padded_entries().next().unwrap();
        assert_eq!(entry.default_tokens, vec!["number", "array"]);
    }

    #[test]
    fn test_render() {
        let table = build(
            &[("[array:list] [object:options]?", method("f")), ("[string]", alias("[array]"))],
            &EngineConfig::default(),
        )
        .unwrap();
        insta::assert_snapshot!(table.render(), @r"
        [array] => [array:list] [object:options]?
        [array, object] => [array:list] [object:options]?
        [string] => [string] -> [array:list] [object:options]?
        ");
    }
}

//! The compilation driver.
//!
//! An [`Engine`] owns everything compilation depends on: the classifier, the
//! configuration and the ordered stage list. Two engines never share state,
//! so extending one (a new classifier rule, an extra stage) cannot change
//! how another compiles.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::classify::Classifier;
use crate::config::EngineConfig;
use crate::description::{Description, Entry};
use crate::error::{CompileError, CompileResult};
use crate::pipeline::{default_stages, PlannedEntry, Stage, Target};
use crate::resolver::Resolver;
use crate::signature::Signature;
use crate::table::{DispatchTable, TableBuilder};

/// Compiles descriptions into resolvers.
pub struct Engine {
    classifier: Arc<Classifier>,
    config: EngineConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("Engine")
            .field("classifier", &self.classifier)
            .field("config", &self.config)
            .field("stages", &stages)
            .finish()
    }
}

impl Engine {
    /// An engine with the standard classifier, default config and stages.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the stages, in run order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Parse every entry and run the stage list over the result.
    pub fn plan(&self, description: &Description) -> CompileResult<Vec<PlannedEntry>> {
        let mut planned = description
            .iter()
            .enumerate()
            .map(|(order, (source, entry))| plan_entry(order, source, entry))
            .collect::<CompileResult<Vec<_>>>()?;

        for stage in &self.stages {
            trace!(stage = stage.name(), "running stage");
            stage.run(&mut planned)?;
        }
        Ok(planned)
    }

    /// Plan and build the dispatch table, without wrapping it in a resolver.
    pub fn build_table(&self, description: &Description) -> CompileResult<DispatchTable> {
        let planned = self.plan(description)?;
        TableBuilder::new(&self.classifier, &self.config).build(planned)
    }

    /// Compile a description into a resolver.
    pub fn compile(&self, description: &Description) -> CompileResult<Resolver> {
        let table = self.build_table(description)?;
        debug!(
            entries = description.len(),
            keys = table.len(),
            "compiled description"
        );
        Ok(Resolver::new(table, Arc::clone(&self.classifier)))
    }
}

fn plan_entry(order: usize, source: &str, entry: &Entry) -> CompileResult<PlannedEntry> {
    let (signature_text, target, defaults) = match entry {
        Entry::Method(imp) => (source, Target::Method(imp.clone()), Vec::new()),
        Entry::Alias(target) => (source, Target::Alias(target.clone()), Vec::new()),
        Entry::Overload(overload) => (
            overload.arguments.as_str(),
            Target::Method(overload.method.clone()),
            overload.defaults.clone(),
        ),
    };

    let signature = Signature::parse(signature_text)?;
    if defaults.len() > signature.len() {
        return Err(CompileError::DefaultsOverflow {
            signature: source.to_string(),
            defaults: defaults.len(),
            params: signature.len(),
        });
    }

    Ok(PlannedEntry::new(order, source, signature, target, defaults))
}

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    classifier: Option<Classifier>,
    config: Option<EngineConfig>,
    stages: Option<Vec<Box<dyn Stage>>>,
}

impl EngineBuilder {
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the whole stage list.
    pub fn stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Append a stage after the current list (the defaults if none was set).
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages
            .get_or_insert_with(default_stages)
            .push(Box::new(stage));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            classifier: Arc::new(self.classifier.unwrap_or_default()),
            config: self.config.unwrap_or_default(),
            stages: self.stages.unwrap_or_else(default_stages),
        }
    }
}

//! The ordered stage table.

use super::{DuplicatePolicy, PipelineConfig};
use crate::errors::RegistrationError;
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::Stage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// An ordered, named sequence of stages run against one evolving value.
///
/// Execution order is registration order. The `Vec` is the source of truth;
/// the name map is only an index into it.
///
/// Registration and removal take `&mut self` while runs take `&self`, so the
/// stage table cannot change underneath an in-flight run. Share a built
/// pipeline across tasks with `Arc<Pipeline>`.
pub struct Pipeline {
    pub(super) config: PipelineConfig,
    pub(super) stages: Vec<Arc<dyn Stage>>,
    index: HashMap<String, usize>,
    pub(super) event_sink: Arc<dyn EventSink>,
}

impl Pipeline {
    /// Creates an empty pipeline with default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PipelineConfig::new(name))
    }

    /// Creates an empty pipeline from a validated config.
    pub fn from_config(config: PipelineConfig) -> Result<Self, RegistrationError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Creates a pipeline with all `stages` registered in the given order.
    pub fn with_stages(
        name: impl Into<String>,
        stages: impl IntoIterator<Item = Arc<dyn Stage>>,
    ) -> Result<Self, RegistrationError> {
        let mut pipeline = Self::new(name);
        for stage in stages {
            pipeline.register(stage)?;
        }
        Ok(pipeline)
    }

    fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
            index: HashMap::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Replaces the event sink.
    pub fn set_event_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.event_sink = sink;
    }

    /// Appends a stage to the end of the table.
    ///
    /// # Errors
    ///
    /// Fails if the stage name is empty, or if it is already taken and the
    /// duplicate policy is [`DuplicatePolicy::Reject`]. Under
    /// [`DuplicatePolicy::Overwrite`] the old stage is replaced in place and
    /// keeps its position.
    pub fn register(&mut self, stage: Arc<dyn Stage>) -> Result<(), RegistrationError> {
        let name = stage.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistrationError::empty_name());
        }

        if let Some(&position) = self.index.get(&name) {
            return match self.config.duplicate_policy {
                DuplicatePolicy::Reject => Err(RegistrationError::duplicate(name)),
                DuplicatePolicy::Overwrite => {
                    debug!(pipeline = %self.config.name, stage = %name, position, "Overwriting stage");
                    self.stages[position] = stage;
                    Ok(())
                }
            };
        }

        debug!(pipeline = %self.config.name, stage = %name, position = self.stages.len(), "Registered stage");
        self.index.insert(name, self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    /// Removes a stage by name, keeping the relative order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Stage>> {
        let position = self.index.remove(name)?;
        let removed = self.stages.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        debug!(pipeline = %self.config.name, stage = %name, "Removed stage");
        Some(removed)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns true if a stage with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.index.get(name).map(|&i| &self.stages[i])
    }

    /// Returns the position of a stage in execution order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

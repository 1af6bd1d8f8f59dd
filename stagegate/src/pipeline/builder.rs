//! Pipeline builder with validation.

use super::{DuplicatePolicy, Pipeline, PipelineConfig};
use crate::errors::RegistrationError;
use crate::events::EventSink;
use crate::stages::Stage;
use std::sync::Arc;
use std::time::Duration;

/// Builder for assembling a pipeline at construction time.
///
/// Each `stage` call registers immediately, so a bad name fails at the call
/// that introduced it.
#[derive(Debug)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder with default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(name),
        }
    }

    /// Creates a builder from a config. The config is validated by `build`.
    #[must_use]
    pub fn from_config(config: PipelineConfig) -> Self {
        let mut pipeline = Pipeline::new(config.name.clone());
        pipeline.config = config;
        Self { pipeline }
    }

    /// Sets the duplicate-name policy for subsequent `stage` calls.
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.pipeline.config.duplicate_policy = policy;
        self
    }

    /// Sets a per-stage time limit.
    #[must_use]
    pub fn with_stage_timeout(mut self, limit: Duration) -> Self {
        self.pipeline.config.stage_timeout_ms = Some(duration_ms(limit));
        self
    }

    /// Sets a per-run time limit.
    #[must_use]
    pub fn with_run_timeout(mut self, limit: Duration) -> Self {
        self.pipeline.config.run_timeout_ms = Some(duration_ms(limit));
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.pipeline.set_event_sink(sink);
        self
    }

    /// Adds a stage after those already added.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already taken (under the
    /// reject policy).
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Result<Self, RegistrationError> {
        self.pipeline.register(stage)?;
        Ok(self)
    }

    /// Adds several stages in order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error encountered.
    pub fn stages(
        mut self,
        stages: impl IntoIterator<Item = Arc<dyn Stage>>,
    ) -> Result<Self, RegistrationError> {
        for stage in stages {
            self.pipeline.register(stage)?;
        }
        Ok(self)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.pipeline.name()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.pipeline.len()
    }

    /// Builds the pipeline.
    ///
    /// An empty pipeline is valid; it returns its input unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline, RegistrationError> {
        self.pipeline.config.validate()?;
        Ok(self.pipeline)
    }
}

fn duration_ms(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

//! The per-stage view of a running pipeline.

use super::RunIdentity;
use crate::cancellation::CancellationToken;
use crate::core::PipelineEvent;
use crate::events::EventSink;
use std::sync::Arc;
use uuid::Uuid;

/// Context handed to a stage alongside its input.
///
/// It is cheap to clone and carries no mutable pipeline state: the input value
/// is the only data a stage receives from the stage before it.
#[derive(Clone)]
pub struct StageContext {
    identity: Arc<RunIdentity>,
    stage_name: String,
    stage_index: usize,
    token: Option<CancellationToken>,
    event_sink: Arc<dyn EventSink>,
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(
        identity: Arc<RunIdentity>,
        stage_name: impl Into<String>,
        stage_index: usize,
        token: Option<CancellationToken>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            identity,
            stage_name: stage_name.into(),
            stage_index,
            token,
            event_sink,
        }
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.identity.run_id
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.identity.pipeline
    }

    /// Returns the stage name.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Returns the stage's position in the pipeline.
    #[must_use]
    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Returns the run's cancellation token, if the caller supplied one.
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    /// Checks if the run has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Emits a custom event tagged with this stage and run.
    ///
    /// Goes to the pipeline's event sink, so nothing is delivered when the
    /// pipeline has events disabled.
    pub fn try_emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        let mut event = PipelineEvent::new(event_type)
            .add_data("stage", serde_json::json!(self.stage_name))
            .add_data("stage_index", serde_json::json!(self.stage_index))
            .add_data("run_id", serde_json::json!(self.identity.run_id.to_string()));
        if let Some(extra) = data {
            event = event.add_data("data", extra);
        }
        self.event_sink.handle(&event);
    }
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("run_id", &self.identity.run_id)
            .field("pipeline", &self.identity.pipeline)
            .field("stage_name", &self.stage_name)
            .field("stage_index", &self.stage_index)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

//! The record of a successful run.

use crate::core::RunState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timing for one stage that executed and validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage name.
    pub name: String,
    /// Position in execution order.
    pub index: usize,
    /// Time spent in `execute` and `validate`.
    pub duration_ms: f64,
}

/// The result of a successful run, with per-stage timings.
///
/// Only produced when every stage passed; a failed run yields just the
/// terminal [`PipelineError`](crate::errors::PipelineError).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The run ID.
    pub run_id: Uuid,
    /// The pipeline name.
    pub pipeline: String,
    /// The final stage's output, or the input for an empty pipeline.
    pub output: serde_json::Value,
    /// One record per stage, in execution order.
    pub stages: Vec<StageRecord>,
    /// Total run time in milliseconds.
    pub duration_ms: f64,
    /// Terminal state; always `Succeeded`.
    pub state: RunState,
}

impl RunReport {
    /// Returns stage names in the order they ran.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Consumes the report, returning the output value.
    #[must_use]
    pub fn into_output(self) -> serde_json::Value {
        self.output
    }
}

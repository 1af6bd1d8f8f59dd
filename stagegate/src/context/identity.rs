//! Run identity for tracking pipeline executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single pipeline run.
///
/// A fresh identity is created for every call to `run`, so concurrent runs of
/// the same pipeline are distinguishable in logs and events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunIdentity {
    /// The unique ID for this run.
    pub run_id: Uuid,
    /// The name of the pipeline being run.
    pub pipeline: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a new run identity with a generated run ID.
    #[must_use]
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self::with_run_id(pipeline, crate::utils::generate_uuid())
    }

    /// Creates a run identity with a specific run ID.
    #[must_use]
    pub fn with_run_id(pipeline: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            run_id,
            pipeline: pipeline.into(),
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identities_are_distinct() {
        let a = RunIdentity::new("orchestrator");
        let b = RunIdentity::new("orchestrator");

        assert_eq!(a.pipeline, "orchestrator");
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_with_run_id() {
        let id = Uuid::new_v4();
        let identity = RunIdentity::with_run_id("p", id);
        assert_eq!(identity.run_id, id);
    }

    #[test]
    fn test_serialization() {
        let identity = RunIdentity::new("p");
        let json = serde_json::to_string(&identity).unwrap();
        let back: RunIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}

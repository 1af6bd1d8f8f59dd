//! Test assertions for pipeline results.

use super::RecordingStage;
use crate::core::FailureKind;
use crate::errors::PipelineError;

/// Asserts that a run failed during `stage`'s `execute`, with a cause whose
/// message contains `cause`.
pub fn assert_execution_failure(err: &PipelineError, stage: &str, cause: &str) {
    assert_eq!(
        err.kind(),
        FailureKind::Execution,
        "Expected an execution failure, got: {err}"
    );
    assert_eq!(err.stage_name(), stage, "Wrong failing stage: {err}");
    let message = err.cause().map(ToString::to_string).unwrap_or_default();
    assert!(
        message.contains(cause),
        "Expected cause containing '{cause}', got '{message}'"
    );
}

/// Asserts that a run failed because `stage`'s validator rejected its output.
pub fn assert_validation_failure(err: &PipelineError, stage: &str) {
    assert_eq!(
        err.kind(),
        FailureKind::Validation,
        "Expected a validation failure, got: {err}"
    );
    assert_eq!(err.stage_name(), stage, "Wrong failing stage: {err}");
}

/// Asserts that none of the given stages ever executed.
pub fn assert_not_invoked(stages: &[&RecordingStage]) {
    for stage in stages {
        assert_eq!(
            stage.execute_count(),
            0,
            "Stage {stage:?} should never have executed"
        );
    }
}

/// Asserts that each stage executed and validated exactly once.
pub fn assert_ran_once(stages: &[&RecordingStage]) {
    for stage in stages {
        assert_eq!(stage.execute_count(), 1, "Stage {stage:?} execute count");
        assert_eq!(stage.validate_count(), 1, "Stage {stage:?} validate count");
    }
}

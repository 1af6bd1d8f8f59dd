//! Run state machine and failure kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run stopped at a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The stage's transform failed.
    Execution,
    /// The stage's output was rejected by its validator.
    Validation,
    /// The run was cancelled.
    Cancelled,
    /// A time limit elapsed.
    Timeout,
}

impl FailureKind {
    /// Returns the error type name used in structured reports.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Execution => "ExecutionError",
            Self::Validation => "ValidationError",
            Self::Cancelled => "CancelledError",
            Self::Timeout => "TimeoutError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execution => write!(f, "execution"),
            Self::Validation => write!(f, "validation"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The state of a single pipeline run.
///
/// `NotStarted -> Running(0) -> Running(1) -> ... -> Succeeded | Failed`.
/// `Running` only ever advances by one index, and the two terminal states
/// accept no further transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// The run has not begun.
    #[default]
    NotStarted,
    /// The stage at `index` is executing or being validated.
    Running {
        /// Position of the current stage.
        index: usize,
    },
    /// Every stage executed and validated.
    Succeeded,
    /// The run stopped at `stage`.
    Failed {
        /// The failing stage.
        stage: String,
        /// What went wrong.
        kind: FailureKind,
    },
}

/// An attempted transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Illegal run state transition from {from} via {attempted}")]
pub struct IllegalTransition {
    /// The state the machine was in.
    pub from: RunState,
    /// The transition that was attempted.
    pub attempted: &'static str,
}

impl RunState {
    /// Returns true for `Succeeded` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// Returns the index of the running stage, if any.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self {
            Self::Running { index } => Some(*index),
            _ => None,
        }
    }

    /// Moves to the stage at `index`.
    ///
    /// Only `NotStarted -> Running(0)` and `Running(i) -> Running(i + 1)` are legal.
    pub fn advance_to(&mut self, index: usize) -> Result<(), IllegalTransition> {
        let legal = match self {
            Self::NotStarted => index == 0,
            Self::Running { index: current } => index == *current + 1,
            _ => false,
        };
        if !legal {
            return Err(IllegalTransition {
                from: self.clone(),
                attempted: "advance",
            });
        }
        *self = Self::Running { index };
        Ok(())
    }

    /// Marks the run as succeeded.
    ///
    /// Legal from `NotStarted` (empty pipeline) or `Running`.
    pub fn succeed(&mut self) -> Result<(), IllegalTransition> {
        if self.is_terminal() {
            return Err(IllegalTransition {
                from: self.clone(),
                attempted: "succeed",
            });
        }
        *self = Self::Succeeded;
        Ok(())
    }

    /// Marks the run as failed at `stage`.
    pub fn fail(&mut self, stage: impl Into<String>, kind: FailureKind) -> Result<(), IllegalTransition> {
        if self.is_terminal() {
            return Err(IllegalTransition {
                from: self.clone(),
                attempted: "fail",
            });
        }
        *self = Self::Failed {
            stage: stage.into(),
            kind,
        };
        Ok(())
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running { index } => write!(f, "running({index})"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { stage, kind } => write!(f, "failed({stage}, {kind})"),
        }
    }
}

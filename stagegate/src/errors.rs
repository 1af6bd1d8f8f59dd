//! Error types for stagegate.
//!
//! Two families live here: [`RegistrationError`] for problems found while
//! assembling a pipeline, and [`PipelineError`] for the terminal failure of a
//! single run. [`StagegateError`] wraps both for callers that want one type.

use crate::core::FailureKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// The umbrella error type for stagegate operations.
#[derive(Debug, Error)]
pub enum StagegateError {
    /// A stage could not be registered or the config was rejected.
    #[error("{0}")]
    Registration(#[from] RegistrationError),

    /// A run terminated on a failing stage.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a registration error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "REGISTRATION-DUPLICATE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error codes carried by [`RegistrationError`].
pub mod codes {
    /// A stage was registered with an empty or whitespace-only name.
    pub const EMPTY_NAME: &str = "REGISTRATION-EMPTY_NAME";
    /// A stage name was registered twice under the reject policy.
    pub const DUPLICATE: &str = "REGISTRATION-DUPLICATE";
    /// A pipeline config failed to parse or validate.
    pub const CONFIG_INVALID: &str = "CONFIG-INVALID";
}

/// Error raised when a stage cannot be registered or a config is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RegistrationError {
    /// The error message.
    pub message: String,
    /// The stage involved, if any.
    pub stage: Option<String>,
    /// Structured diagnostic info.
    pub error_info: ContractErrorInfo,
}

impl RegistrationError {
    /// A stage name was empty.
    #[must_use]
    pub fn empty_name() -> Self {
        Self {
            message: "Stage name cannot be empty or whitespace-only".to_string(),
            stage: None,
            error_info: ContractErrorInfo::new(codes::EMPTY_NAME, "Stage name is empty")
                .with_fix_hint("Give every stage a non-empty, unique name."),
        }
    }

    /// A stage name is already taken.
    #[must_use]
    pub fn duplicate(stage: impl Into<String>) -> Self {
        let stage = stage.into();
        Self {
            message: format!("Stage '{stage}' is already registered"),
            error_info: ContractErrorInfo::new(
                codes::DUPLICATE,
                format!("Duplicate stage name '{stage}'"),
            )
            .with_fix_hint("Rename the stage, or use DuplicatePolicy::Overwrite to replace it.")
            .with_context_entry("stage", stage.clone()),
            stage: Some(stage),
        }
    }

    /// A pipeline config is invalid.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            message: format!("Invalid pipeline config: {reason}"),
            stage: None,
            error_info: ContractErrorInfo::new(codes::CONFIG_INVALID, reason),
        }
    }

    /// Returns the error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.error_info.code
    }
}

/// The terminal error of a pipeline run.
///
/// Always names the first stage that failed. No partial result accompanies it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stage's transform itself failed.
    #[error("Stage '{stage}' failed to execute: {cause}")]
    Execution {
        /// The failing stage.
        stage: String,
        /// The underlying cause, forwarded untouched.
        #[source]
        cause: anyhow::Error,
    },

    /// The stage produced an output its own validator rejected.
    #[error("Stage '{stage}' failed validation")]
    Validation {
        /// The failing stage.
        stage: String,
        /// The rejected output.
        output: serde_json::Value,
    },

    /// The run was cancelled through its token.
    #[error("Pipeline cancelled at stage '{stage}': {reason}")]
    Cancelled {
        /// The stage that was about to run or was running.
        stage: String,
        /// The cancellation reason.
        reason: String,
    },

    /// A configured stage or run time limit elapsed.
    #[error("Stage '{stage}' timed out after {}ms", limit.as_millis())]
    Timeout {
        /// The stage that was running.
        stage: String,
        /// The limit that was exceeded.
        limit: Duration,
    },
}

impl PipelineError {
    /// Creates an execution error.
    #[must_use]
    pub fn execution(stage: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::Execution {
            stage: stage.into(),
            cause,
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(stage: impl Into<String>, output: serde_json::Value) -> Self {
        Self::Validation {
            stage: stage.into(),
            output,
        }
    }

    /// Returns the name of the stage that failed.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        match self {
            Self::Execution { stage, .. }
            | Self::Validation { stage, .. }
            | Self::Cancelled { stage, .. }
            | Self::Timeout { stage, .. } => stage,
        }
    }

    /// Returns the kind of failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Execution { .. } => FailureKind::Execution,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Cancelled { .. } => FailureKind::Cancelled,
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }

    /// Returns true for an execution fault.
    #[must_use]
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Returns true for a validation rejection.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns the underlying cause of an execution error.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Execution { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns the rejected output of a validation error.
    #[must_use]
    pub fn rejected_output(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Validation { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind().error_type()));
        map.insert("stage".to_string(), serde_json::json!(self.stage_name()));

        match self {
            Self::Execution { cause, .. } => {
                map.insert("cause".to_string(), serde_json::json!(format!("{cause:#}")));
            }
            Self::Validation { output, .. } => {
                map.insert("output".to_string(), output.clone());
            }
            Self::Cancelled { reason, .. } => {
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Timeout { limit, .. } => {
                map.insert("limit_ms".to_string(), serde_json::json!(limit.as_millis()));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

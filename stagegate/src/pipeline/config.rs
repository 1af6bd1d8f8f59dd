//! Pipeline configuration.

use crate::errors::{RegistrationError, StagegateError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What `register` does with a name that is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with a registration error.
    #[default]
    Reject,
    /// Replace the existing stage, keeping its position.
    Overwrite,
}

/// Configuration for a [`Pipeline`](super::Pipeline).
///
/// Every limit is off by default: a default-configured pipeline never times
/// out on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The pipeline name, used in logs and events.
    pub name: String,
    /// Handling of duplicate stage names.
    pub duplicate_policy: DuplicatePolicy,
    /// Upper bound on a single stage's `execute`, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_ms: Option<u64>,
    /// Upper bound on a whole run, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<u64>,
    /// Whether lifecycle events are sent to the event sink.
    pub emit_events: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            duplicate_policy: DuplicatePolicy::Reject,
            stage_timeout_ms: None,
            run_timeout_ms: None,
            emit_events: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a default config with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Loads a config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StagegateError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Parses and validates a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RegistrationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RegistrationError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the config.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::invalid_config(
                "pipeline name cannot be empty or whitespace-only",
            ));
        }
        if self.stage_timeout_ms == Some(0) {
            return Err(RegistrationError::invalid_config("stage_timeout_ms must be positive"));
        }
        if self.run_timeout_ms == Some(0) {
            return Err(RegistrationError::invalid_config("run_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Returns the per-stage time limit, if any.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the per-run time limit, if any.
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_impose_no_limits() {
        let config = PipelineConfig::default();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.stage_timeout().is_none());
        assert!(config.run_timeout().is_none());
        assert!(config.emit_events);
    }

    #[test]
    fn test_from_json() {
        let config = PipelineConfig::from_json(
            r#"{
                "name": "orchestrator",
                "duplicate_policy": "overwrite",
                "stage_timeout_ms": 5000
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, "orchestrator");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(config.stage_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.run_timeout(), None);
        assert!(config.emit_events);
    }

    #[test]
    fn test_invalid_configs() {
        let err = PipelineConfig::from_json(r#"{"name": "  "}"#).unwrap_err();
        assert_eq!(err.code(), codes::CONFIG_INVALID);

        let err = PipelineConfig::from_json(r#"{"name": "p", "run_timeout_ms": 0}"#).unwrap_err();
        assert!(err.to_string().contains("run_timeout_ms"));

        let err = PipelineConfig::from_json(r#"{"duplicate_policy": "ignore"}"#).unwrap_err();
        assert_eq!(err.code(), codes::CONFIG_INVALID);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "from-disk", "emit_events": false}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.name, "from-disk");
        assert!(!config.emit_events);
    }

    #[test]
    fn test_from_missing_file() {
        let result = PipelineConfig::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(StagegateError::Io(_))));
    }

    #[test]
    fn test_roundtrip_skips_unset_limits() {
        let json = serde_json::to_value(PipelineConfig::new("p")).unwrap();
        assert!(json.get("stage_timeout_ms").is_none());
        assert_eq!(json["duplicate_policy"], "reject");
    }
}

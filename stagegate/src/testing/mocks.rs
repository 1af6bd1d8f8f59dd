//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::StageContext;
use crate::stages::{Stage, Validator};

/// A shared, ordered log of stage calls across a whole pipeline.
///
/// Entries look like `"execute:design"` and `"validate:design"`.
#[derive(Debug, Clone, Default)]
pub struct CallTrace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallTrace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.entries.lock().push(entry);
    }

    /// Returns the recorded entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    PassThrough,
    Return(Value),
    Fail(String),
}

/// A stage that records its inputs and returns a configurable result.
pub struct RecordingStage {
    name: String,
    behavior: Behavior,
    validator: Option<Validator>,
    inputs: Mutex<Vec<Value>>,
    executions: AtomicUsize,
    validations: AtomicUsize,
    trace: Option<CallTrace>,
}

impl RecordingStage {
    fn with_behavior(name: impl Into<String>, behavior: Behavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            validator: None,
            inputs: Mutex::new(Vec::new()),
            executions: AtomicUsize::new(0),
            validations: AtomicUsize::new(0),
            trace: None,
        }
    }

    /// A stage that returns its input unchanged.
    #[must_use]
    pub fn pass_through(name: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::PassThrough)
    }

    /// A stage that ignores its input and returns `output`.
    #[must_use]
    pub fn returning(name: impl Into<String>, output: Value) -> Self {
        Self::with_behavior(name, Behavior::Return(output))
    }

    /// A stage whose `execute` always fails with `cause`.
    #[must_use]
    pub fn failing(name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::Fail(cause.into()))
    }

    /// Sets the validation predicate.
    #[must_use]
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Makes `validate` reject every output.
    #[must_use]
    pub fn rejecting(self) -> Self {
        self.with_validator(|_| false)
    }

    /// Records calls into a shared trace.
    #[must_use]
    pub fn with_trace(mut self, trace: CallTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Returns the number of `execute` calls.
    #[must_use]
    pub fn execute_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    /// Returns the number of `validate` calls.
    #[must_use]
    pub fn validate_count(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    /// Returns every input `execute` received, in order.
    #[must_use]
    pub fn inputs(&self) -> Vec<Value> {
        self.inputs.lock().clone()
    }
}

impl std::fmt::Debug for RecordingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingStage")
            .field("name", &self.name)
            .field("behavior", &self.behavior)
            .field("executions", &self.execute_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value, _ctx: &StageContext) -> anyhow::Result<Value> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(trace) = &self.trace {
            trace.push(format!("execute:{}", self.name));
        }
        self.inputs.lock().push(input.clone());

        match &self.behavior {
            Behavior::PassThrough => Ok(input),
            Behavior::Return(output) => Ok(output.clone()),
            Behavior::Fail(cause) => Err(anyhow::anyhow!("{cause}")),
        }
    }

    fn validate(&self, output: &Value) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if let Some(trace) = &self.trace {
            trace.push(format!("validate:{}", self.name));
        }
        self.validator.as_ref().map_or(true, |v| v(output))
    }
}

/// A stage that sleeps before passing its input through.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowStage {
    /// Creates a new slow stage.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }

    /// Shares in-flight counters with other slow stages.
    #[must_use]
    pub fn sharing_counters(mut self, other: &Self) -> Self {
        self.in_flight = other.in_flight.clone();
        self.max_in_flight = other.max_in_flight.clone();
        self
    }

    /// Returns the largest number of concurrent `execute` calls observed
    /// across all stages sharing these counters.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: Value, _ctx: &StageContext) -> anyhow::Result<Value> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunIdentity;
    use crate::events::NoOpEventSink;
    use serde_json::json;

    fn ctx() -> StageContext {
        StageContext::new(Arc::new(RunIdentity::new("t")), "s", 0, None, Arc::new(NoOpEventSink))
    }

    #[tokio::test]
    async fn test_recording_stage_counts_and_records() {
        let trace = CallTrace::new();
        let stage = RecordingStage::returning("s", json!({"ok": true})).with_trace(trace.clone());

        let out = stage.execute(json!(1), &ctx()).await.unwrap();
        assert!(stage.validate(&out));

        assert_eq!(stage.execute_count(), 1);
        assert_eq!(stage.validate_count(), 1);
        assert_eq!(stage.inputs(), vec![json!(1)]);
        assert_eq!(trace.entries(), vec!["execute:s", "validate:s"]);
    }

    #[tokio::test]
    async fn test_failing_and_rejecting() {
        let failing = RecordingStage::failing("f", "boom");
        let err = failing.execute(json!(null), &ctx()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let rejecting = RecordingStage::pass_through("r").rejecting();
        assert!(!rejecting.validate(&json!(1)));
    }

    #[tokio::test]
    async fn test_slow_stage_tracks_concurrency() {
        let a = SlowStage::with_delay_ms("a", 1);
        let b = SlowStage::with_delay_ms("b", 1).sharing_counters(&a);

        a.execute(json!(1), &ctx()).await.unwrap();
        b.execute(json!(1), &ctx()).await.unwrap();
        assert_eq!(a.max_in_flight(), 1);
        assert_eq!(b.max_in_flight(), 1);
    }
}

//! Where pipeline events go.

use crate::core::PipelineEvent;
use parking_lot::Mutex;
use tracing::{debug, info, warn, Level};

/// Receives the events a run produces, in emission order.
///
/// `handle` is called inline by the runner and by stages, so it must return
/// quickly and must not panic. Sinks never influence a run's outcome.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn handle(&self, event: &PipelineEvent);
}

/// Discards every event. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn handle(&self, _event: &PipelineEvent) {}
}

/// Writes events to `tracing`.
///
/// Failure events (`*.failed`) are always logged at `WARN`; everything else
/// at the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a sink logging routine events at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a sink logging routine events at `DEBUG`.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn handle(&self, event: &PipelineEvent) {
        let kind = event.event_type.as_str();
        let stage = event.get("stage").and_then(|v| v.as_str()).unwrap_or("-");

        if kind.ends_with(".failed") {
            let reason = event.get("kind").and_then(|v| v.as_str()).unwrap_or("unknown");
            warn!(event = kind, stage, reason, "Pipeline event");
        } else if self.level >= Level::DEBUG {
            // tracing orders levels by verbosity: DEBUG and TRACE compare greater than INFO.
            debug!(event = kind, stage, data = ?event.data, "Pipeline event");
        } else {
            info!(event = kind, stage, "Pipeline event");
        }
    }
}

/// Keeps every event in memory, for tests and in-process inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event received so far.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Returns the event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Returns the events tagged with `stage`.
    #[must_use]
    pub fn for_stage(&self, stage: &str) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.get("stage").and_then(|v| v.as_str()) == Some(stage))
            .cloned()
            .collect()
    }

    /// Returns the number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for CollectingEventSink {
    fn handle(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FailureKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.handle(&PipelineEvent::pipeline_started("p", "run-1", 2));
        sink.handle(&PipelineEvent::stage_started("concept", 0));
        sink.handle(&PipelineEvent::stage_completed("concept", 0, 1.5));

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.event_types(),
            vec!["pipeline.started", "stage.started", "stage.completed"]
        );
    }

    #[test]
    fn test_collecting_sink_filters_by_stage() {
        let sink = CollectingEventSink::new();
        sink.handle(&PipelineEvent::stage_started("concept", 0));
        sink.handle(&PipelineEvent::stage_started("design", 1));
        sink.handle(&PipelineEvent::stage_failed(
            "design",
            1,
            &FailureKind::Execution.to_string(),
            "token service unavailable",
        ));

        let design = sink.for_stage("design");
        assert_eq!(design.len(), 2);
        assert_eq!(design[1].get("kind"), Some(&serde_json::json!("execution")));
        assert!(sink.for_stage("code").is_empty());
    }

    #[test]
    fn test_logging_and_noop_sinks_accept_every_event() {
        let events = [
            PipelineEvent::stage_started("concept", 0),
            PipelineEvent::pipeline_failed("p", "run-1", "concept", "validation"),
        ];
        for event in &events {
            NoOpEventSink.handle(event);
            LoggingEventSink::default().handle(event);
            LoggingEventSink::debug().handle(event);
        }
    }
}

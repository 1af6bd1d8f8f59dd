//! Event sink system for observability.
//!
//! A pipeline owns one sink and reports its lifecycle to it. Sinks never
//! influence control flow.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

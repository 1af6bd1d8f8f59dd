//! Core domain model types for stagegate.
//!
//! This module contains:
//! - The per-run state machine and failure kinds
//! - Lifecycle events
//! - Shape guards for pipeline values

mod event;
mod status;
pub mod value;

pub use event::PipelineEvent;
pub use status::{FailureKind, IllegalTransition, RunState};

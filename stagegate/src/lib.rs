//! # Stagegate
//!
//! Sequential stage pipelines with a validation gate between every stage.
//!
//! A [`Pipeline`](pipeline::Pipeline) holds an ordered list of named stages.
//! `run` feeds the caller's input to the first stage, checks each output with
//! that stage's validator, and hands accepted output to the next stage. The
//! first execution error or rejected output halts the run with a
//! [`PipelineError`](errors::PipelineError) naming the stage.
//!
//! - **Stages**: implement [`Stage`](stages::Stage), or wrap a closure in
//!   [`FnStage`](stages::FnStage) / [`AsyncFnStage`](stages::AsyncFnStage)
//! - **Registration**: incremental `register` or a [`PipelineBuilder`](pipeline::PipelineBuilder)
//! - **Lifecycle events**: pluggable [`EventSink`](events::EventSink) plus `tracing` spans
//! - **Cancellation and budgets**: opt-in token and per-stage/per-run time limits
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::{json, Value};
//! use stagegate::prelude::*;
//! use std::sync::Arc;
//!
//! let pipeline = PipelineBuilder::new("quick-start")
//!     .stage(Arc::new(FnStage::new("double", |v: Value| {
//!         Ok(json!(v.as_i64().unwrap_or_default() * 2))
//!     })))
//!     .unwrap()
//!     .stage(Arc::new(
//!         FnStage::new("label", |v: Value| Ok(json!({ "value": v })))
//!             .with_validator(|out| field_truthy(out, "value")),
//!     ))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let output = tokio_test::block_on(pipeline.run(json!(21))).unwrap();
//! assert_eq!(output, json!({ "value": 42 }));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::context::{RunIdentity, StageContext};
    pub use crate::core::value::{array_len, field, field_truthy, truthy};
    pub use crate::core::{FailureKind, PipelineEvent, RunState};
    pub use crate::errors::{
        ContractErrorInfo, PipelineError, RegistrationError, StagegateError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::pipeline::{
        DuplicatePolicy, Pipeline, PipelineBuilder, PipelineConfig, RunReport, StageRecord,
    };
    pub use crate::stages::{AsyncFnStage, FnStage, NoOpStage, Stage, Validator};
}

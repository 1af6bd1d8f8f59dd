//! Pipeline building and execution.
//!
//! This module provides:
//! - The ordered stage table ([`Pipeline`])
//! - A builder that validates registrations as they happen
//! - Sequential execution with a validation gate after every stage
//! - Configuration for duplicate handling and optional time limits

mod builder;
mod config;
mod report;
mod runner;
mod staged;

pub use builder::PipelineBuilder;
pub use config::{DuplicatePolicy, PipelineConfig};
pub use report::{RunReport, StageRecord};
pub use staged::Pipeline;

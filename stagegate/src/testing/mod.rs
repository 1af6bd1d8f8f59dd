//! Testing utilities for stagegate pipelines.
//!
//! This module provides:
//! - Mock stages that count calls and record inputs
//! - A shared call trace for checking cross-stage ordering
//! - Assertions for the two failure kinds

mod assertions;
mod mocks;

pub use assertions::{
    assert_execution_failure, assert_not_invoked, assert_ran_once, assert_validation_failure,
};
pub use mocks::{CallTrace, RecordingStage, SlowStage};

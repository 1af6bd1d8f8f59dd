//! Context management for pipeline execution.
//!
//! This module provides:
//! - Run identity shared by every stage of one run
//! - The per-stage context passed to `Stage::execute`

mod identity;
mod stage;

pub use identity::RunIdentity;
pub use stage::StageContext;

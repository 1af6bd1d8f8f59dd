//! Cooperative cancellation for pipeline runs.
//!
//! Cancellation is opt-in: a plain `run` never observes a token.

mod token;

pub use token::{CancelCallback, CancellationToken};

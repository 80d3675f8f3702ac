//! # The supervised control loop: body, inputs and failure records.
//!
//! - [`ControlLoop`] / [`LoopFn`] what the supervisor runs
//! - [`LoopInputs`] / [`Input`] what one attempt consumes
//! - [`FailureReporter`] / [`RecoveryRecord`] how failures reach the supervisor

mod body;
mod inputs;
mod record;

pub use body::{ControlLoop, LoopFn, LoopRef};
pub use inputs::{FailureReporter, Input, LoopInputs};
pub use record::{FailureOrigin, RecoveryRecord};

use crossbeam_channel::Receiver;

/// Creates the per-attempt failure channel.
///
/// Unbounded so that reporting never blocks the loop.
pub(crate) fn failure_channel(attempt: u32) -> (FailureReporter, Receiver<RecoveryRecord>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (FailureReporter::new(tx, attempt), rx)
}

//! Runtime core: supervision of the control loop.
//!
//! The public API from this module is [`Supervisor`] (with its builder and
//! handle) and the [`LoopState`] it publishes.
//!
//! Internal modules:
//! - [`runner`]: executes one attempt on the control thread and publishes its terminal event;
//! - [`supervisor`]: walks the state machine, logs recovery batches, applies the restart policy;
//! - [`builder`]: assembles the bus and subscriber set;
//! - [`state`]: the state machine.

mod builder;
mod runner;
mod state;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use state::LoopState;
pub use supervisor::{Supervisor, SupervisorHandle};

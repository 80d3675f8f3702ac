//! Restart and backoff policies.
//!
//! These knobs decide **whether** the supervisor relaunches the control loop
//! after it terminates and **how long** it waits first.
//!
//! ## Contents
//! - [`RestartPolicy`] the continuation decision (never / on-failure / always)
//! - [`BackoffPolicy`] how relaunch delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization applied on top of the backoff delay
//!
//! ## Quick wiring
//! ```text
//! Config { restart, backoff }
//!      └─► core::supervisor, after each recovery batch:
//!           restart.decide(exit, &backoff, consecutive_failures)
//!             ├─► Decision::Relaunch { delay }
//!             ├─► Decision::Terminate      (failure, no relaunch)
//!             └─► Decision::Stop           (clean exit, no relaunch)
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::Never`: terminal after the first failure batch.
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=30s, jitter=None.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::{Decision, Exit, RestartPolicy};

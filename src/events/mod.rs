//! Supervision events: types and broadcast bus.
//!
//! The supervisor publishes one [`LoopEvent`] per control-loop transition on a
//! [`Bus`]. These are diagnostics about the loop itself; application events
//! travel on the runtime's events channel instead.
//!
//! ## Contents
//! - [`LoopEventKind`], [`LoopEvent`] classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::supervisor`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's subscriber listener (fans out to
//!   `SubscriberSet`) and anything holding `SupervisorHandle::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{LoopEvent, LoopEventKind};

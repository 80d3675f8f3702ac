//! # Supervision event subscribers.
//!
//! ```text
//! Supervisor ── publish(LoopEvent) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                            ├──► [queue] ─► LogWriter
//!                                                            └──► [queue] ─► custom
//! ```
//!
//! Implement [`Subscribe`] to hook into the control loop's lifecycle (metrics,
//! crash reporting, UI indicators). [`LogWriter`] writes every event through
//! `tracing`.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub(crate) use set::panic_message;
pub use subscribe::Subscribe;

//! # Process-lifetime channels.
//!
//! ```text
//!              ┌──────────────────────── Runtime<P> ─────────────────────────┐
//! application ─┼─► RequestSender ──► requests  (rendezvous) ──► RequestReceiver ─┼─► control loop
//! host ────────┼─► ActivityBridge ─► activity  (1 slot)     ──► ActivitySlot ────┼─► control loop
//! control loop ┼─► EventSender ────► events    (bounded 10) ──► EventReceiver ───┼─► application
//! control loop ┼─► SoundSender ────► sound     (rendezvous) ──► SoundReceiver ───┼─► audio backend
//!              └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each channel exists once per [`Runtime`]. The runtime holds both ends of
//! every channel for as long as it lives, so none of them disconnects while the
//! application runs. Handles are direction-restricted wrappers: the types
//! application code can reach ([`RequestSender`], [`EventReceiver`]) expose only
//! one direction.
//!
//! Errors are crossbeam's, re-exported here; every send error hands the
//! unsent value back.

mod inbound;
mod outbound;
mod registry;
mod sound;

pub use crossbeam_channel::{
    RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError,
};
pub use inbound::{RequestReceiver, RequestSender};
pub use outbound::{EventReceiver, EventSender};
pub use registry::{Protocol, Runtime};
pub use sound::{AudioBackend, SoundReceiver, SoundSender};

//! # hostloop
//!
//! **hostloop** is the coordination layer between a native host (a mobile OS
//! activity, a windowing shell) and an application's control loop.
//!
//! It provides the process-lifetime channels both sides talk through, a
//! supervisor that runs the control loop on its own thread and recovers its
//! failures, and the small logging/diagnostics kit around them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      host callbacks           application code            audio backend
//!            │                   ▲           │                    ▲
//!   ActivityBridge        EventReceiver  RequestSender      SoundReceiver
//!            ▼                   │           ▼                    │
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Runtime<P> (channel registry, cloned into every component)          │
//! │  activity: 1 slot │ events: bounded 10 │ requests: rendezvous │ sound │
//! └──────────────────────────────────┬───────────────────────────────────┘
//!                                    ▼ LoopInputs<P> (per attempt)
//!                     ┌──────────────────────────────┐
//!                     │  "hostloop-control" thread   │
//!                     │  ControlLoop::run(inputs)    │
//!                     └──────────────┬───────────────┘
//!                                    ▼ Ok / Err(LoopError) / panic
//!                     ┌──────────────────────────────┐
//!                     │  Supervisor (tokio)          │──► Bus ──► SubscriberSet
//!                     │  log batch + stack, decide   │
//!                     └──────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Starting ─► Running{n} ─► Failed{n} ─► Recovering{n} ─┬─► BackingOff ─► Running{n+1}
//!                 │                                      └─► Terminated (default policy)
//!                 └─ clean exit ─► Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Channels**      | The four process-lifetime channels and their directional views | [`Runtime`], [`Protocol`], [`RequestSender`], [`EventReceiver`] |
//! | **Lifecycle**     | Opaque activity handles with single-slot delivery             | [`ActivityHandle`], [`ActivityBridge`]      |
//! | **Control loop**  | The supervised body and its per-attempt inputs                | [`ControlLoop`], [`LoopFn`], [`LoopInputs`] |
//! | **Supervision**   | Failure recovery, restart decisions, state watching           | [`Supervisor`], [`LoopState`]               |
//! | **Policies**      | Restart and backoff strategies                                | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Subscriber API**| Hook into supervision events                                  | [`Subscribe`], [`LogWriter`]                |
//! | **Diagnostics**   | Conditional logging and full stack capture                    | [`Logger`], [`StackTrace`]                  |
//! | **Errors**        | Typed errors for the runtime and the loop body                | [`RuntimeError`], [`LoopError`]             |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use hostloop::{
//!     ActivityHandle, Config, Input, LogWriter, LoopError, LoopFn, LoopInputs, Protocol,
//!     Runtime, Subscribe, Supervisor,
//! };
//!
//! struct App;
//! impl Protocol for App {
//!     type Request = String;
//!     type Event = String;
//!     type Sound = ();
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rt = Runtime::<App>::init(Config::default());
//!
//!     let body = LoopFn::arc("main", |inputs: LoopInputs<App>| -> Result<(), LoopError> {
//!         match inputs.next()? {
//!             Input::Activity(h) => inputs
//!                 .events
//!                 .send(format!("created {:#x}", h.into_raw()))
//!                 .map_err(|_| LoopError::Disconnected),
//!             Input::Request(_) => Ok(()),
//!         }
//!     });
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let handle = Supervisor::builder(rt.clone())
//!         .with_subscribers(subs)
//!         .build()
//!         .spawn(body);
//!
//!     rt.lifecycle_bridge().deliver(ActivityHandle::from_raw(0x1000))?;
//!     handle.join().await?;
//!
//!     assert_eq!(rt.events().try_recv()?, "created 0x1000");
//!     Ok(())
//! }
//! ```

mod channels;
mod config;
mod control;
mod core;
mod error;
mod events;
mod lifecycle;
mod logging;
mod policies;
mod stacktrace;
mod subscribers;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use channels::{
    AudioBackend, EventReceiver, EventSender, Protocol, RecvError, RecvTimeoutError,
    RequestReceiver, RequestSender, Runtime, SendError, SendTimeoutError, SoundReceiver,
    SoundSender, TryRecvError, TrySendError,
};
pub use config::{Config, DEBUG_ENV, DEFAULT_EVENTS_CAPACITY, VERBOSE_ENV};
pub use control::{
    ControlLoop, FailureOrigin, FailureReporter, Input, LoopFn, LoopInputs, LoopRef,
    RecoveryRecord,
};
pub use self::core::{LoopState, Supervisor, SupervisorBuilder, SupervisorHandle};
pub use error::{LoopError, RuntimeError};
pub use events::{Bus, LoopEvent, LoopEventKind};
pub use lifecycle::{ActivityBridge, ActivityHandle, ActivitySlot, DeliveryError};
pub use logging::{LOG_FORMAT_ENV, Logger, init_tracing};
pub use policies::{BackoffPolicy, Decision, Exit, JitterPolicy, RestartPolicy};
pub use stacktrace::{BacktraceSource, DEFAULT_STACK_BUFFER, StackSource, StackTrace, stacktrace};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

//! # Lifecycle bridge: host activity handles into the control loop.
//!
//! The host creates its native activity asynchronously (e.g. from an
//! `onCreate` callback) and hands the resulting reference to the runtime. The
//! reference travels as an [`ActivityHandle`], an opaque token the runtime
//! stores and forwards but never interprets.
//!
//! ```text
//! host callback ──► ActivityBridge::deliver ──► [ 1 slot ] ──► ActivitySlot::recv ──► control loop
//! ```
//!
//! ## Rules
//! - At most one handle is pending; a second delivery blocks until the control
//!   loop consumes the first.
//! - Callbacks that must not block use [`ActivityBridge::try_deliver`] or
//!   [`ActivityBridge::deliver_timeout`] and get the handle back on failure.

use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvError, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError, TrySendError,
};
use thiserror::Error;

use crate::logging::Logger;

/// Opaque reference to host application state.
///
/// Only two operations exist: wrap a raw token, and get it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActivityHandle(usize);

impl ActivityHandle {
    /// Wraps a host-provided token (e.g. a pointer value cast to `usize`).
    pub const fn from_raw(token: usize) -> Self {
        Self(token)
    }

    /// Returns the token exactly as it was delivered.
    pub const fn into_raw(self) -> usize {
        self.0
    }
}

/// Why a delivery did not complete. The handle is handed back.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// A previous handle has not been consumed yet.
    #[error("an activity handle is already pending")]
    Pending(ActivityHandle),

    /// The slot stayed occupied for the whole timeout.
    #[error("activity slot still occupied after timeout")]
    Timeout(ActivityHandle),

    /// The runtime is gone.
    #[error("activity slot disconnected")]
    Disconnected(ActivityHandle),
}

impl DeliveryError {
    /// Returns the handle that was not delivered.
    pub fn into_handle(self) -> ActivityHandle {
        match self {
            DeliveryError::Pending(h) | DeliveryError::Timeout(h) | DeliveryError::Disconnected(h) => h,
        }
    }
}

/// Host-side writer into the activity slot.
#[derive(Clone, Debug)]
pub struct ActivityBridge {
    tx: Sender<ActivityHandle>,
    logger: Logger,
}

impl ActivityBridge {
    pub(crate) fn new(tx: Sender<ActivityHandle>, logger: Logger) -> Self {
        Self { tx, logger }
    }

    /// Delivers `handle`, blocking while another handle is pending.
    pub fn deliver(&self, handle: ActivityHandle) -> Result<(), DeliveryError> {
        self.tx
            .send(handle)
            .map_err(|e| DeliveryError::Disconnected(e.into_inner()))?;
        crate::debugf!(self.logger, "activity {:#x} delivered", handle.into_raw());
        Ok(())
    }

    /// Delivers `handle`, waiting at most `timeout` for the slot to free up.
    pub fn deliver_timeout(
        &self,
        handle: ActivityHandle,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        self.tx.send_timeout(handle, timeout).map_err(|e| match e {
            SendTimeoutError::Timeout(h) => DeliveryError::Timeout(h),
            SendTimeoutError::Disconnected(h) => DeliveryError::Disconnected(h),
        })?;
        crate::debugf!(self.logger, "activity {:#x} delivered", handle.into_raw());
        Ok(())
    }

    /// Delivers `handle` only if the slot is free.
    pub fn try_deliver(&self, handle: ActivityHandle) -> Result<(), DeliveryError> {
        self.tx.try_send(handle).map_err(|e| match e {
            TrySendError::Full(h) => DeliveryError::Pending(h),
            TrySendError::Disconnected(h) => DeliveryError::Disconnected(h),
        })?;
        crate::debugf!(self.logger, "activity {:#x} delivered", handle.into_raw());
        Ok(())
    }

    /// True if a delivered handle has not been consumed yet.
    pub fn is_pending(&self) -> bool {
        self.tx.is_full()
    }
}

/// Control-loop side of the activity slot.
#[derive(Clone, Debug)]
pub struct ActivitySlot {
    pub(crate) rx: Receiver<ActivityHandle>,
}

impl ActivitySlot {
    pub(crate) fn new(rx: Receiver<ActivityHandle>) -> Self {
        Self { rx }
    }

    /// Blocks until a handle is delivered.
    pub fn recv(&self) -> Result<ActivityHandle, RecvError> {
        self.rx.recv()
    }

    /// Blocks for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ActivityHandle, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Takes the pending handle, if any.
    pub fn try_recv(&self) -> Result<ActivityHandle, TryRecvError> {
        self.rx.try_recv()
    }

    /// True if a handle is waiting.
    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

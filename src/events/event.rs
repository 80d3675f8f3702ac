//! # Supervision events.
//!
//! [`LoopEventKind`] classifies what happened to the control loop; [`LoopEvent`]
//! carries the metadata (attempt, reason, delay, stack dump).
//!
//! Every event gets a process-wide monotonic `seq`, so consumers can restore
//! publication order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use hostloop::{LoopEvent, LoopEventKind};
//!
//! let ev = LoopEvent::new(LoopEventKind::BackoffScheduled)
//!     .with_attempt(3)
//!     .with_reason("boom")
//!     .with_delay(Duration::from_millis(400));
//!
//! assert_eq!(ev.delay_ms, Some(400));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervision events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEventKind {
    /// A control-loop attempt is being launched.
    ///
    /// Sets: `attempt`
    LoopStarting,

    /// The attempt returned `Ok(())`.
    ///
    /// Sets: `attempt`
    LoopStopped,

    /// The attempt ended abnormally (error or panic).
    ///
    /// Sets: `attempt`, `reason` (terminating record)
    LoopFailed,

    /// One recovery record has been logged with its stack dump.
    ///
    /// Sets: `attempt`, `reason`, `stack`
    RecoveryLogged,

    /// A relaunch has been scheduled.
    ///
    /// Sets: `attempt` (the one that just ended), `delay_ms`, `reason`
    /// (last failure, absent after a clean exit)
    BackoffScheduled,

    /// The supervisor gave up; no further attempts.
    ///
    /// Sets: `attempt`, `reason`
    LoopTerminated,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `subscriber`, `reason`
    SubscriberPanicked,

    /// A subscriber queue was full or closed; the event was dropped for it.
    ///
    /// Sets: `subscriber`, `reason`
    SubscriberOverflow,
}

/// Supervision event with optional metadata.
#[derive(Clone, Debug)]
pub struct LoopEvent {
    /// Process-wide monotonic sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: LoopEventKind,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Failure reason or other human-readable detail.
    pub reason: Option<Arc<str>>,
    /// Relaunch delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Stack dump captured while logging a recovery record.
    pub stack: Option<Arc<str>>,
    /// Subscriber name for subscriber events.
    pub subscriber: Option<&'static str>,
}

impl LoopEvent {
    /// Creates an event stamped with the current time and next sequence number.
    pub fn new(kind: LoopEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            reason: None,
            delay_ms: None,
            stack: None,
            subscriber: None,
        }
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay, stored as milliseconds (saturating at `u32::MAX`).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_stack(mut self, stack: impl Into<Arc<str>>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = LoopEvent::new(LoopEventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = LoopEvent::new(LoopEventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// True for events emitted by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            LoopEventKind::SubscriberOverflow | LoopEventKind::SubscriberPanicked
        )
    }
}

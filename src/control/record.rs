//! # Recovery records.
//!
//! A [`RecoveryRecord`] describes one failure occurrence inside the control
//! loop. Records are produced by the loop (explicit reports, returned errors,
//! panics) and consumed only by the supervisor, which logs each one before it
//! decides what to do next.

use std::sync::Arc;
use std::time::SystemTime;

/// Where a recovery record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOrigin {
    /// The loop body panicked.
    Panic,
    /// The loop body returned an error.
    Returned,
    /// The loop body reported a failure through `FailureReporter` and kept going.
    Reported,
}

impl FailureOrigin {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            FailureOrigin::Panic => "panic",
            FailureOrigin::Returned => "returned",
            FailureOrigin::Reported => "reported",
        }
    }
}

/// One failure occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryRecord {
    reason: Arc<str>,
    at: SystemTime,
    attempt: u32,
    origin: FailureOrigin,
    stack: Option<Arc<str>>,
}

impl RecoveryRecord {
    /// Creates a record stamped with the current time.
    pub fn new(reason: impl Into<Arc<str>>, attempt: u32, origin: FailureOrigin) -> Self {
        Self {
            reason: reason.into(),
            at: SystemTime::now(),
            attempt,
            origin,
            stack: None,
        }
    }

    /// Attaches the stack captured on the control thread where the failure happened.
    pub fn with_stack(mut self, stack: impl Into<Arc<str>>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub(crate) fn reason_arc(&self) -> Arc<str> {
        Arc::clone(&self.reason)
    }

    /// When the failure was recorded.
    #[inline]
    pub fn at(&self) -> SystemTime {
        self.at
    }

    /// Attempt during which the failure happened (starting from 1).
    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    pub fn origin(&self) -> FailureOrigin {
        self.origin
    }

    /// Failure-site stack, set on the record that ended the attempt.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

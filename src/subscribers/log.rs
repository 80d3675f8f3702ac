//! # LogWriter: supervision events through `tracing`
//!
//! ```text
//! INFO  loop starting attempt=1
//! ERROR loop failed attempt=1 reason="boom"
//! WARN  relaunch scheduled attempt=1 delay_ms=100 reason="boom"
//! ERROR loop terminated attempt=1 reason="boom"
//! ```
//!
//! Stack dumps are emitted at `debug` level; the supervisor already logs them
//! with each recovery record.

use async_trait::async_trait;

use crate::events::{LoopEvent, LoopEventKind};
use crate::subscribers::Subscribe;

/// Subscriber writing every supervision event to `tracing`.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &LoopEvent) {
        let attempt = e.attempt.unwrap_or(0);
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            LoopEventKind::LoopStarting => {
                tracing::info!(seq = e.seq, attempt, "loop starting");
            }
            LoopEventKind::LoopStopped => {
                tracing::info!(seq = e.seq, attempt, "loop stopped");
            }
            LoopEventKind::LoopFailed => {
                tracing::error!(seq = e.seq, attempt, reason, "loop failed");
            }
            LoopEventKind::RecoveryLogged => {
                tracing::debug!(
                    seq = e.seq,
                    attempt,
                    reason,
                    stack = e.stack.as_deref().unwrap_or(""),
                    "recovery logged"
                );
            }
            LoopEventKind::BackoffScheduled => {
                tracing::warn!(
                    seq = e.seq,
                    attempt,
                    delay_ms = e.delay_ms.unwrap_or(0),
                    reason,
                    "relaunch scheduled"
                );
            }
            LoopEventKind::LoopTerminated => {
                tracing::error!(seq = e.seq, attempt, reason, "loop terminated");
            }
            LoopEventKind::SubscriberOverflow | LoopEventKind::SubscriberPanicked => {
                tracing::warn!(
                    seq = e.seq,
                    subscriber = e.subscriber.unwrap_or("unknown"),
                    reason,
                    "subscriber trouble"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

//! Error types used by the hostloop runtime and the supervised control loop.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the runtime itself (startup, supervision).
//! - [`LoopError`]: errors returned by a control-loop body.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logs
//! and [`LoopError::is_retryable`] for restart decisions.

use thiserror::Error;

use crate::control::RecoveryRecord;

/// # Errors produced by the hostloop runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected at startup.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with it.
        reason: String,
    },

    /// The OS refused to start a runtime thread (control loop or audio).
    #[error("failed to spawn runtime thread: {source}")]
    Spawn {
        /// Underlying I/O error from `std::thread::Builder::spawn`.
        #[from]
        source: std::io::Error,
    },

    /// The sound channel already has its audio backend.
    #[error("audio backend already started")]
    AudioAlreadyStarted,

    /// The supervisor decided not to relaunch the control loop.
    #[error("unrecoverable control loop after {attempts} attempt(s): {}", last_reason(.records))]
    Unrecoverable {
        /// Number of attempts made, including the last one.
        attempts: u32,
        /// The recovery batch that led to the terminal decision.
        records: Vec<RecoveryRecord>,
    },

    /// The supervisor task itself panicked or was aborted.
    #[error("supervisor aborted: {reason}")]
    Aborted {
        /// Panic message or cancellation notice from the join handle.
        reason: String,
    },
}

fn last_reason(records: &[RecoveryRecord]) -> &str {
    records.last().map(|r| r.reason()).unwrap_or("no failure recorded")
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use hostloop::RuntimeError;
    ///
    /// let err = RuntimeError::InvalidConfig { reason: "events_capacity must be > 0".into() };
    /// assert_eq!(err.as_label(), "runtime_invalid_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::AudioAlreadyStarted => "runtime_audio_already_started",
            RuntimeError::Unrecoverable { .. } => "runtime_unrecoverable",
            RuntimeError::Aborted { .. } => "runtime_supervisor_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
            RuntimeError::Spawn { source } => format!("spawn failed: {source}"),
            RuntimeError::AudioAlreadyStarted => "audio backend already started".to_string(),
            RuntimeError::Unrecoverable { attempts, records } => {
                let reasons: Vec<&str> = records.iter().map(|r| r.reason()).collect();
                format!("gave up after {attempts} attempt(s); reasons={reasons:?}")
            }
            RuntimeError::Aborted { reason } => format!("supervisor aborted: {reason}"),
        }
    }
}

/// # Errors returned by a control-loop body.
///
/// Returning an error ends the current attempt; the supervisor records it and
/// applies the restart policy. [`LoopError::Fatal`] is never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// Non-recoverable error (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The attempt failed but a fresh attempt may succeed.
    #[error("control loop failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// An input channel was disconnected (the runtime was dropped).
    #[error("input channel disconnected")]
    Disconnected,
}

impl LoopError {
    /// Shorthand for [`LoopError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        LoopError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`LoopError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        LoopError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use hostloop::LoopError;
    ///
    /// assert_eq!(LoopError::fail("boom").as_label(), "loop_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopError::Fatal { .. } => "loop_fatal",
            LoopError::Fail { .. } => "loop_failed",
            LoopError::Disconnected => "loop_disconnected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoopError::Fatal { error } => format!("fatal: {error}"),
            LoopError::Fail { error } => format!("error: {error}"),
            LoopError::Disconnected => "input disconnected".to_string(),
        }
    }

    /// Indicates whether a restart policy may relaunch after this error.
    ///
    /// # Example
    /// ```
    /// use hostloop::LoopError;
    ///
    /// assert!(LoopError::fail("boom").is_retryable());
    /// assert!(!LoopError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoopError::Fail { .. })
    }
}

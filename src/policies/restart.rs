//! # Restart policies for the supervised control loop.
//!
//! [`RestartPolicy`] turns the way an attempt ended ([`Exit`]) into a
//! [`Decision`].
//!
//! | policy                | clean exit         | failure                  | fatal     |
//! |-----------------------|--------------------|--------------------------|-----------|
//! | `Never` (default)     | `Stop`             | `Terminate`              | `Terminate` |
//! | `OnFailure`           | `Stop`             | `Relaunch` after backoff | `Terminate` |
//! | `Always { interval }` | `Relaunch` after interval | `Relaunch` after backoff | `Terminate` |
//!
//! `Never` is the default because a control loop that failed once is assumed to
//! have left the runtime in an unknown state. Choose `OnFailure` to keep the
//! application alive across transient failures.

use std::time::Duration;

use super::BackoffPolicy;

/// How a control-loop attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// The body returned `Ok(())`.
    Clean,
    /// The body failed in a way a fresh attempt may fix (error or panic).
    Failed,
    /// The body returned a fatal error.
    Fatal,
}

/// Continuation outcome computed after a recovery batch has been logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Start a fresh attempt after `delay`.
    Relaunch {
        /// Wait before the next attempt.
        delay: Duration,
    },
    /// Give up permanently and surface an error.
    Terminate,
    /// End supervision without error.
    Stop,
}

/// Policy controlling whether the control loop is relaunched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RestartPolicy {
    /// Never relaunch: the first failure batch is terminal (default).
    #[default]
    Never,
    /// Relaunch after failures, with backoff; a clean exit stops supervision.
    OnFailure,
    /// Relaunch after every exit.
    ///   - `interval`: delay after a clean exit (`None` → immediately)
    Always { interval: Option<Duration> },
}

impl RestartPolicy {
    /// Computes the decision for `exit`.
    ///
    /// `consecutive_failures` counts failures since the last clean exit,
    /// including this one; it selects the backoff step (`n - 1`).
    pub fn decide(
        &self,
        exit: Exit,
        backoff: &BackoffPolicy,
        consecutive_failures: u32,
    ) -> Decision {
        match (self, exit) {
            (_, Exit::Fatal) => Decision::Terminate,
            (RestartPolicy::Never, Exit::Failed) => Decision::Terminate,
            (RestartPolicy::Never | RestartPolicy::OnFailure, Exit::Clean) => Decision::Stop,
            (RestartPolicy::Always { interval }, Exit::Clean) => Decision::Relaunch {
                delay: interval.unwrap_or(Duration::ZERO),
            },
            (RestartPolicy::OnFailure | RestartPolicy::Always { .. }, Exit::Failed) => {
                Decision::Relaunch {
                    delay: backoff.next(consecutive_failures.saturating_sub(1)),
                }
            }
        }
    }

    /// True if this policy may ever relaunch after a failure.
    pub fn retries_failures(&self) -> bool {
        !matches!(self, RestartPolicy::Never)
    }
}

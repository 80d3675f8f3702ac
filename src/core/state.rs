//! # Supervisor state machine.
//!
//! ```text
//! Starting ─► Running{n} ─┬─ Ok ──────────────────────────────► Decision
//!                         └─ Err/panic ─► Failed{n} ─► Recovering{n} ─► Decision
//!
//! Decision ─┬─ Relaunch ─► BackingOff{n, delay} ─► Running{n+1}
//!           ├─ Stop ─────► Stopped
//!           └─ Terminate ► Terminated
//! ```

use std::time::Duration;

/// Current phase of the supervised control loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Supervisor created, no attempt launched yet.
    Starting,
    /// Attempt `attempt` is running on the control thread.
    Running { attempt: u32 },
    /// Attempt `attempt` ended abnormally.
    Failed { attempt: u32 },
    /// The recovery batch of `attempt` is being logged.
    Recovering { attempt: u32 },
    /// Waiting `delay` before the next attempt.
    BackingOff { attempt: u32, delay: Duration },
    /// Supervision ended after a clean exit.
    Stopped,
    /// Supervision gave up after a failure.
    Terminated,
}

impl LoopState {
    /// True once no further attempt will run.
    pub fn is_final(&self) -> bool {
        matches!(self, LoopState::Stopped | LoopState::Terminated)
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopState::Starting => "starting",
            LoopState::Running { .. } => "running",
            LoopState::Failed { .. } => "failed",
            LoopState::Recovering { .. } => "recovering",
            LoopState::BackingOff { .. } => "backing_off",
            LoopState::Stopped => "stopped",
            LoopState::Terminated => "terminated",
        }
    }
}

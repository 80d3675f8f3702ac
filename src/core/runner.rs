//! # Run a single attempt of the control loop.
//!
//! The body runs on a dedicated OS thread so that its blocking channel
//! operations never stall the async supervisor. The thread's outcome comes
//! back through a oneshot.
//!
//! ## Event flow
//!
//! ```text
//! Clean:
//!   body.run() → Ok(())          → publish LoopStopped
//!
//! Failure:
//!   body.run() → Err(Fail/Fatal) → publish LoopFailed
//!   body.run() → panic           → publish LoopFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event.
//! - The failure batch is every record reported during the attempt followed by
//!   the terminating record. A clean exit discards reported records.
//! - The terminating record carries a stack captured on the control thread:
//!   from the panic hook for panics, right after `run` returns for errors.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::thread;

use tokio::sync::oneshot;

use crate::channels::{Protocol, Runtime};
use crate::control::{FailureOrigin, LoopInputs, LoopRef, RecoveryRecord, failure_channel};
use crate::error::{LoopError, RuntimeError};
use crate::events::{Bus, LoopEvent, LoopEventKind};
use crate::policies::Exit;
use crate::stacktrace::StackTrace;
use crate::subscribers::panic_message;

/// Name of the thread each attempt runs on.
pub(crate) const CONTROL_THREAD: &str = "hostloop-control";

/// How one attempt ended.
#[derive(Debug)]
pub(crate) struct AttemptEnd {
    pub exit: Exit,
    /// Empty after a clean exit.
    pub batch: Vec<RecoveryRecord>,
}

enum ThreadOutcome {
    Clean,
    Returned { err: LoopError, stack: String },
    Panicked { info: String, stack: String },
}

thread_local! {
    /// Initial capture buffer; set only on control threads.
    static PANIC_CAPTURE: Cell<Option<usize>> = const { Cell::new(None) };
    static PANIC_STACK: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Chains a hook that records the panicking control thread's stack before
/// it unwinds. Other threads pass straight through to the previous hook.
fn install_panic_hook() {
    static PANIC_HOOK_INIT: OnceLock<()> = OnceLock::new();
    PANIC_HOOK_INIT.get_or_init(|| {
        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            if let Some(initial) = PANIC_CAPTURE.try_with(Cell::get).ok().flatten() {
                let stack = StackTrace::new().with_initial(initial).capture();
                let _ = PANIC_STACK.try_with(|slot| *slot.borrow_mut() = Some(stack));
            }
            previous_hook(panic_info);
        }));
    });
}

/// Runs `body` on the current (control) thread and captures the failure stack.
fn run_on_control_thread<P: Protocol>(
    body: &LoopRef<P>,
    inputs: LoopInputs<P>,
    stack_buffer: usize,
) -> ThreadOutcome {
    let capturer = StackTrace::new().with_initial(stack_buffer);
    PANIC_CAPTURE.with(|c| c.set(Some(stack_buffer)));

    match catch_unwind(AssertUnwindSafe(|| body.run(inputs))) {
        Ok(Ok(())) => ThreadOutcome::Clean,
        Ok(Err(err)) => ThreadOutcome::Returned {
            err,
            stack: capturer.capture(),
        },
        Err(panic) => ThreadOutcome::Panicked {
            info: panic_message(panic.as_ref()),
            // A hook installed after ours may not chain; fall back to the unwound stack.
            stack: PANIC_STACK
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(|| capturer.capture()),
        },
    }
}

/// Executes attempt `attempt` of `body` and waits for it to finish.
///
/// Fails only if the control thread cannot be spawned.
pub(crate) async fn run_once<P: Protocol>(
    body: &LoopRef<P>,
    runtime: &Runtime<P>,
    attempt: u32,
    bus: &Bus,
) -> Result<AttemptEnd, RuntimeError> {
    install_panic_hook();

    let (reporter, reported) = failure_channel(attempt);
    let inputs = runtime.loop_inputs(attempt, reporter);
    let stack_buffer = runtime.config().stack_buffer_or_default();
    let (tx, rx) = oneshot::channel();

    let body = Arc::clone(body);
    thread::Builder::new()
        .name(CONTROL_THREAD.to_string())
        .spawn(move || {
            let _ = tx.send(run_on_control_thread(&body, inputs, stack_buffer));
        })?;

    let outcome = rx.await.unwrap_or_else(|_| ThreadOutcome::Panicked {
        info: "control thread exited without reporting".to_string(),
        stack: String::new(),
    });

    let (exit, last) = match outcome {
        ThreadOutcome::Clean => {
            bus.publish(LoopEvent::new(LoopEventKind::LoopStopped).with_attempt(attempt));
            return Ok(AttemptEnd {
                exit: Exit::Clean,
                batch: Vec::new(),
            });
        }
        ThreadOutcome::Returned { err, stack } => {
            let exit = match err {
                LoopError::Fatal { .. } => Exit::Fatal,
                _ => Exit::Failed,
            };
            let record = RecoveryRecord::new(err.to_string(), attempt, FailureOrigin::Returned)
                .with_stack(stack);
            (exit, record)
        }
        ThreadOutcome::Panicked { info, stack } => {
            let mut record = RecoveryRecord::new(info, attempt, FailureOrigin::Panic);
            if !stack.is_empty() {
                record = record.with_stack(stack);
            }
            (Exit::Failed, record)
        }
    };

    bus.publish(
        LoopEvent::new(LoopEventKind::LoopFailed)
            .with_attempt(attempt)
            .with_reason(last.reason_arc()),
    );

    let mut batch: Vec<RecoveryRecord> = reported.try_iter().collect();
    batch.push(last);
    Ok(AttemptEnd { exit, batch })
}

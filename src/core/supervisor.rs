//! # Supervisor: runs the control loop, logs failures, decides what's next.
//!
//! The [`Supervisor`] owns the runtime context, the supervision [`Bus`] and a
//! [`SubscriberSet`]. It runs one attempt at a time and walks the
//! [`LoopState`] machine between attempts.
//!
//! ## High-level architecture
//! ```text
//! Supervisor::run(body)
//!
//! loop {
//!   ├─► state Running{n}, publish LoopStarting
//!   ├─► run_once() ──► "hostloop-control" thread ──► body.run(inputs)
//!   │       ▼
//!   │   AttemptEnd { exit, batch }
//!   │       ▼
//!   ├─► failure? state Failed{n} → Recovering{n}
//!   │       └─► for record in batch: tracing::error!(reason, site + supervisor stack), publish RecoveryLogged
//!   ├─► RestartPolicy::decide(exit)
//!   │     ├─► Relaunch  → state BackingOff, publish BackoffScheduled, sleep
//!   │     ├─► Stop      → state Stopped, Ok(())
//!   │     └─► Terminate → state Terminated, publish LoopTerminated, Err(Unrecoverable)
//! }
//!
//! Event flow:
//!   run_once / supervisor ── publish(LoopEvent) ──► Bus ──► listener ──► SubscriberSet::emit
//! ```
//!
//! ## Rules
//! - Every record of a batch is logged before the decision is made.
//! - Recovery logging is never gated by the verbose/debug switches.
//! - After the supervisor ends, the runtime's channels stay open: application
//!   threads blocked on a request send stay blocked.
//! - `run` returns only after every subscriber has handled the events
//!   published so far; the subscriber workers end with it.
//!
//! ## Example
//! ```rust
//! use hostloop::{Config, LoopError, LoopFn, LoopInputs, Protocol, Runtime, Supervisor};
//!
//! struct App;
//! impl Protocol for App {
//!     type Request = u32;
//!     type Event = u32;
//!     type Sound = ();
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let rt = Runtime::<App>::new(Config::default()).unwrap();
//!     let body = LoopFn::arc("main", |inputs: LoopInputs<App>| -> Result<(), LoopError> {
//!         inputs.events.send(1).map_err(|_| LoopError::Disconnected)?;
//!         Ok(())
//!     });
//!
//!     Supervisor::new(rt.clone()).run(body).await.unwrap();
//!     assert_eq!(rt.events().try_recv(), Ok(1));
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use crate::channels::{Protocol, Runtime};
use crate::control::{LoopRef, RecoveryRecord};
use crate::error::RuntimeError;
use crate::events::{Bus, LoopEvent, LoopEventKind};
use crate::policies::{Decision, Exit};
use crate::stacktrace::StackTrace;
use crate::subscribers::{SubscriberSet, panic_message};

use super::builder::SupervisorBuilder;
use super::runner::run_once;
use super::state::LoopState;

/// Supervises a [`ControlLoop`](crate::ControlLoop) body over a [`Runtime`].
pub struct Supervisor<P: Protocol> {
    pub(crate) runtime: Runtime<P>,
    pub(crate) bus: Bus,
    pub(crate) subs: Option<SubscriberSet>,
    pub(crate) state: watch::Sender<LoopState>,
}

impl<P: Protocol> Supervisor<P> {
    /// Supervisor without subscribers.
    pub fn new(runtime: Runtime<P>) -> Self {
        SupervisorBuilder::new(runtime).build()
    }

    /// Starts a builder for a supervisor over `runtime`.
    pub fn builder(runtime: Runtime<P>) -> SupervisorBuilder<P> {
        SupervisorBuilder::new(runtime)
    }

    /// Watches the supervisor's state.
    pub fn state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Receives supervision events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.bus.subscribe()
    }

    /// Runs `body` until the restart policy stops or terminates supervision.
    ///
    /// Returns `Ok(())` after a clean exit that is not relaunched, and
    /// [`RuntimeError::Unrecoverable`] carrying the last recovery batch when
    /// the supervisor gives up.
    pub async fn run(mut self, body: LoopRef<P>) -> Result<(), RuntimeError> {
        let listener = self.subscriber_listener();
        let res = self.supervise(&body).await;
        if let Some(listener) = listener {
            listener.stop().await;
        }
        res
    }

    async fn supervise(&self, body: &LoopRef<P>) -> Result<(), RuntimeError> {
        let logger = self.runtime.logger();
        let cfg = self.runtime.config().clone();
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            self.set_state(LoopState::Running { attempt });
            self.bus
                .publish(LoopEvent::new(LoopEventKind::LoopStarting).with_attempt(attempt));
            crate::logf!(logger, "control loop '{}' attempt {attempt} starting", body.name());

            let end = run_once(body, &self.runtime, attempt, &self.bus).await?;

            if end.exit == Exit::Clean {
                failures = 0;
                crate::logf!(logger, "control loop '{}' exited cleanly", body.name());
            } else {
                failures = failures.saturating_add(1);
                self.set_state(LoopState::Failed { attempt });
                self.set_state(LoopState::Recovering { attempt });
                self.log_batch(&end.batch, cfg.stack_buffer_or_default());
            }

            let last_reason = end.batch.last().map(RecoveryRecord::reason_arc);
            match cfg.restart.decide(end.exit, &cfg.backoff, failures) {
                Decision::Relaunch { delay } => {
                    self.set_state(LoopState::BackingOff { attempt, delay });
                    let mut ev = LoopEvent::new(LoopEventKind::BackoffScheduled)
                        .with_attempt(attempt)
                        .with_delay(delay);
                    if let Some(reason) = last_reason {
                        ev = ev.with_reason(reason);
                    }
                    self.bus.publish(ev);
                    crate::debugf!(logger, "relaunching in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                Decision::Stop => {
                    self.set_state(LoopState::Stopped);
                    return Ok(());
                }
                Decision::Terminate => {
                    self.set_state(LoopState::Terminated);
                    let reason = last_reason.unwrap_or_else(|| Arc::from("terminated"));
                    tracing::error!(
                        target: "hostloop",
                        attempt,
                        reason = %reason,
                        "control loop is unrecoverable; supervision terminated"
                    );
                    self.bus.publish(
                        LoopEvent::new(LoopEventKind::LoopTerminated)
                            .with_attempt(attempt)
                            .with_reason(reason),
                    );
                    return Err(RuntimeError::Unrecoverable {
                        attempts: attempt,
                        records: end.batch,
                    });
                }
            }
        }
    }

    /// Runs the supervisor on a tokio task.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn(self, body: LoopRef<P>) -> SupervisorHandle {
        let state = self.state.subscribe();
        let bus = self.bus.clone();
        let join = tokio::spawn(self.run(body));
        SupervisorHandle { state, bus, join }
    }

    /// Logs each record with its failure-site stack, followed by a capture of
    /// the supervisor's own thread, and publishes it.
    fn log_batch(&self, batch: &[RecoveryRecord], stack_buffer: usize) {
        let capturer = StackTrace::new().with_initial(stack_buffer);
        for record in batch {
            let supervisor_stack = capturer.capture();
            let stack = match record.stack() {
                Some(site) => format!("{site}\n{supervisor_stack}"),
                None => supervisor_stack,
            };
            tracing::error!(
                target: "hostloop",
                attempt = record.attempt(),
                origin = record.origin().as_label(),
                reason = %record.reason(),
                stack = %stack,
                "control loop failure recovered"
            );
            self.bus.publish(
                LoopEvent::new(LoopEventKind::RecoveryLogged)
                    .with_attempt(record.attempt())
                    .with_reason(record.reason_arc())
                    .with_stack(stack),
            );
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.send_replace(state);
    }

    /// Forwards bus events to the subscriber set until stopped.
    fn subscriber_listener(&mut self) -> Option<Listener> {
        let set = self.subs.take().filter(|set| !set.is_empty())?;
        let mut rx = self.bus.subscribe();
        let (done, mut finished) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = &mut finished => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });
        Some(Listener { done, task })
    }
}

/// Running subscriber listener.
struct Listener {
    done: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Listener {
    /// Forwards what is already on the bus, then waits for the subscribers.
    async fn stop(self) {
        let _ = self.done.send(());
        let _ = self.task.await;
    }
}

/// Handle to a supervisor running on a tokio task.
pub struct SupervisorHandle {
    state: watch::Receiver<LoopState>,
    bus: Bus,
    join: JoinHandle<Result<(), RuntimeError>>,
}

impl SupervisorHandle {
    /// Latest published state.
    pub fn state(&self) -> LoopState {
        self.state.borrow().clone()
    }

    /// Watches state transitions.
    pub fn watch(&self) -> watch::Receiver<LoopState> {
        self.state.clone()
    }

    /// Receives supervision events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.bus.subscribe()
    }

    /// True once the supervisor task has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the supervisor to end and returns its result.
    pub async fn join(self) -> Result<(), RuntimeError> {
        match self.join.await {
            Ok(res) => res,
            Err(err) if err.is_panic() => Err(RuntimeError::Aborted {
                reason: panic_message(err.into_panic().as_ref()),
            }),
            Err(err) => Err(RuntimeError::Aborted {
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::control::{FailureOrigin, Input, LoopFn, LoopInputs};
    use crate::error::LoopError;
    use crate::policies::{BackoffPolicy, RestartPolicy};
    use crate::test_support::TestProto;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn runtime_with(restart: RestartPolicy) -> Runtime<TestProto> {
        Runtime::new(Config {
            restart,
            backoff: BackoffPolicy::constant(Duration::from_millis(5)),
            stack_buffer: 64,
            ..Config::default()
        })
        .unwrap()
    }

    fn serve_one_then_fail() -> LoopRef<TestProto> {
        LoopFn::arc("serve-one", |inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
            match inputs.next()? {
                Input::Request(n) => {
                    inputs.failures.report(format!("request {n} half-applied"));
                    Err(LoopError::fail("renderer crashed"))
                }
                Input::Activity(_) => Ok(()),
            }
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn default_policy_logs_batch_then_terminates() {
        let rt = runtime_with(RestartPolicy::default());
        let sup = Supervisor::new(rt.clone());
        let mut state = sup.state();
        let mut events = sup.subscribe();

        let rm = rt.resource_manager();
        let app = std::thread::spawn(move || rm.send(5));

        let err = sup.run(serve_one_then_fail()).await.unwrap_err();
        app.join().unwrap().unwrap();

        match &err {
            RuntimeError::Unrecoverable { attempts, records } => {
                assert_eq!(*attempts, 1);
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].origin(), FailureOrigin::Reported);
                assert_eq!(records[1].reason(), "control loop failed: renderer crashed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*state.borrow_and_update(), LoopState::Terminated);

        assert!(logs_contain("control loop failure recovered"));
        assert!(logs_contain("request 5 half-applied"));
        assert!(logs_contain("renderer crashed"));
        assert!(logs_contain("stack="));
        assert!(logs_contain("supervision terminated"));

        let mut kinds = Vec::new();
        let mut stacks = Vec::new();
        while let Ok(ev) = events.try_recv() {
            if let Some(stack) = &ev.stack {
                stacks.push(stack.clone());
            }
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            [
                LoopEventKind::LoopStarting,
                LoopEventKind::LoopFailed,
                LoopEventKind::RecoveryLogged,
                LoopEventKind::RecoveryLogged,
                LoopEventKind::LoopTerminated,
            ]
        );
        assert_eq!(stacks.len(), 2);
        assert!(stacks.iter().all(|s| s.len() > 64));

        // Nobody services requests anymore.
        let rm = rt.resource_manager();
        assert!(matches!(
            rm.send_timeout(6, Duration::from_millis(20)),
            Err(crate::SendTimeoutError::Timeout(6))
        ));
    }

    #[inline(never)]
    fn decode_frame_site(frame: u32) -> Result<(), LoopError> {
        if std::hint::black_box(frame) > 0 {
            panic!("frame {frame} decode failed");
        }
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn logged_stack_names_the_control_thread_and_failure_site() {
        let rt = runtime_with(RestartPolicy::default());
        let body = LoopFn::arc("decoder", |_inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
            decode_frame_site(3)
        });
        let sup = Supervisor::new(rt);
        let mut events = sup.subscribe();
        assert!(sup.run(body).await.is_err());

        let stack = std::iter::from_fn(|| events.try_recv().ok())
            .find(|ev| ev.kind == LoopEventKind::RecoveryLogged)
            .and_then(|ev| ev.stack)
            .expect("recovery event carries a stack");
        assert!(stack.starts_with("thread 'hostloop-control'"), "{stack}");
        assert!(stack.contains("decode_frame_site"), "{stack}");
        assert!(logs_contain("hostloop-control"));
    }

    #[tokio::test]
    async fn on_failure_relaunches_until_clean_exit() {
        let rt = runtime_with(RestartPolicy::OnFailure);
        let runs = Arc::new(AtomicU32::new(0));
        let body = {
            let runs = Arc::clone(&runs);
            LoopFn::arc("flaky", move |inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
                runs.fetch_add(1, Ordering::SeqCst);
                if inputs.attempt() < 3 {
                    panic!("attempt {} exploded", inputs.attempt());
                }
                Ok(())
            })
        };

        let sup = Supervisor::new(rt);
        let mut events = sup.subscribe();
        sup.run(body).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        let backoffs: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|ev| ev.kind == LoopEventKind::BackoffScheduled)
            .collect();
        assert_eq!(backoffs.len(), 2);
        assert!(backoffs[0].delay_ms.is_some_and(|ms| ms <= 5));
        assert_eq!(backoffs[1].reason.as_deref(), Some("attempt 2 exploded"));
    }

    struct Counting(AtomicU32);

    #[async_trait::async_trait]
    impl crate::subscribers::Subscribe for Counting {
        async fn on_event(&self, _event: &LoopEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn run_drains_and_releases_subscribers() {
        let rt = runtime_with(RestartPolicy::default());
        let sub = Arc::new(Counting(AtomicU32::new(0)));
        let sup = Supervisor::builder(rt).subscriber(sub.clone()).build();
        let body = LoopFn::arc("fails", |_inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
            Err(LoopError::fail("surface lost"))
        });

        assert!(sup.run(body).await.is_err());

        // LoopStarting, LoopFailed, RecoveryLogged, LoopTerminated
        assert_eq!(sub.0.load(Ordering::SeqCst), 4);
        assert_eq!(Arc::strong_count(&sub), 1, "subscriber workers must be gone");
    }

    #[tokio::test]
    async fn fatal_error_terminates_even_with_restarts() {
        let rt = runtime_with(RestartPolicy::Always { interval: None });
        let body = LoopFn::arc("fatal", |_inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
            Err(LoopError::fatal("corrupt save file"))
        });

        let handle = Supervisor::new(rt).spawn(body);
        let err = handle.join().await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_unrecoverable");
        assert!(err.to_string().contains("corrupt save file"));
    }

    #[tokio::test]
    async fn clean_exit_stops_under_default_policy() {
        let rt = runtime_with(RestartPolicy::default());
        let body = LoopFn::arc("once", |inputs: LoopInputs<TestProto>| -> Result<(), LoopError> {
            inputs
                .events
                .send("ready".to_string())
                .map_err(|_| LoopError::Disconnected)
        });

        let handle = Supervisor::new(rt.clone()).spawn(body);
        let mut watch = handle.watch();
        watch.wait_for(LoopState::is_final).await.unwrap();
        assert_eq!(handle.state(), LoopState::Stopped);
        handle.join().await.unwrap();
        assert_eq!(rt.events().try_recv().unwrap(), "ready");
    }
}

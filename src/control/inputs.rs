//! # Inputs of one control-loop attempt.
//!
//! [`LoopInputs`] is everything the loop body may touch: the consumer ends of
//! the activity slot and request channel, producer ends of the events and
//! sound channels, and a [`FailureReporter`] for non-terminal failures.
//!
//! ```text
//! activity slot ─┐
//!                ├─ Select ──► LoopInputs::next() ─► Input::{Activity, Request}
//! requests ──────┘
//! ```

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::channels::{EventSender, Protocol, RequestReceiver, SoundSender};
use crate::error::LoopError;
use crate::lifecycle::{ActivityHandle, ActivitySlot};
use crate::logging::Logger;

use super::record::{FailureOrigin, RecoveryRecord};

/// One input selected by [`LoopInputs::next`].
#[derive(Debug, PartialEq, Eq)]
pub enum Input<R> {
    /// The host delivered a new activity handle.
    Activity(ActivityHandle),
    /// Application code submitted a resource request.
    Request(R),
}

/// Reports failures the loop survives.
///
/// Reported records join the recovery batch only if the attempt later ends
/// abnormally; after a clean exit they are dropped.
#[derive(Clone, Debug)]
pub struct FailureReporter {
    tx: Sender<RecoveryRecord>,
    attempt: u32,
}

impl FailureReporter {
    pub(crate) fn new(tx: Sender<RecoveryRecord>, attempt: u32) -> Self {
        Self { tx, attempt }
    }

    /// Records a failure with `reason`.
    pub fn report(&self, reason: impl Into<std::sync::Arc<str>>) {
        let record = RecoveryRecord::new(reason, self.attempt, FailureOrigin::Reported);
        // The supervisor outlives the attempt; a send error means it is gone.
        let _ = self.tx.send(record);
    }
}

/// Per-attempt view of the runtime's channels.
pub struct LoopInputs<P: Protocol> {
    /// Activity handles delivered by the host.
    pub activity: ActivitySlot,
    /// Resource requests from application code.
    pub requests: RequestReceiver<P::Request>,
    /// Outbound application events.
    pub events: EventSender<P::Event>,
    /// Requests to the audio backend.
    pub sound: SoundSender<P::Sound>,
    /// Non-terminal failure reports.
    pub failures: FailureReporter,
    pub(crate) attempt: u32,
    pub(crate) logger: Logger,
}

impl<P: Protocol> LoopInputs<P> {
    /// Attempt number, starting from 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Logger with the runtime's switches.
    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// Blocks until an activity handle or a request arrives.
    ///
    /// If both are ready, one is picked at random.
    pub fn next(&self) -> Result<Input<P::Request>, LoopError> {
        select_input(&self.activity.rx, &self.requests.rx, None)?.ok_or(LoopError::Disconnected)
    }

    /// Like [`next`](Self::next) but returns `Ok(None)` after `timeout`.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Input<P::Request>>, LoopError> {
        select_input(&self.activity.rx, &self.requests.rx, Some(timeout))
    }
}

fn select_input<R>(
    activity: &Receiver<ActivityHandle>,
    requests: &Receiver<R>,
    timeout: Option<Duration>,
) -> Result<Option<Input<R>>, LoopError> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut sel = crossbeam_channel::Select::new();
    let activity_idx = sel.recv(activity);
    let request_idx = sel.recv(requests);

    let op = match deadline {
        Some(at) => match sel.select_deadline(at) {
            Ok(op) => op,
            Err(_) => return Ok(None),
        },
        None => sel.select(),
    };

    let input = if op.index() == activity_idx {
        op.recv(activity).map(Input::Activity)
    } else {
        debug_assert_eq!(op.index(), request_idx);
        op.recv(requests).map(Input::Request)
    };
    input.map(Some).map_err(|_| LoopError::Disconnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Runtime;
    use crate::config::Config;
    use crate::control::failure_channel;
    use crate::test_support::TestProto;
    use std::thread;

    #[test]
    fn next_yields_activity_and_requests() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let (reporter, _records) = failure_channel(1);
        let inputs = rt.loop_inputs(1, reporter);

        rt.lifecycle_bridge()
            .deliver(ActivityHandle::from_raw(42))
            .unwrap();
        assert_eq!(
            inputs.next().unwrap(),
            Input::Activity(ActivityHandle::from_raw(42))
        );

        let rm = rt.resource_manager();
        let app = thread::spawn(move || rm.send(7).unwrap());
        assert_eq!(inputs.next().unwrap(), Input::Request(7));
        app.join().unwrap();
    }

    #[test]
    fn next_timeout_returns_none_when_idle() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let (reporter, _records) = failure_channel(1);
        let inputs = rt.loop_inputs(1, reporter);
        assert_eq!(
            inputs.next_timeout(Duration::from_millis(10)).unwrap(),
            None
        );
    }

    #[test]
    fn reporter_stamps_attempt() {
        let (reporter, records) = failure_channel(3);
        reporter.report("texture upload failed");
        let rec = records.try_recv().unwrap();
        assert_eq!(rec.reason(), "texture upload failed");
        assert_eq!(rec.attempt(), 3);
        assert_eq!(rec.origin(), FailureOrigin::Reported);
    }
}

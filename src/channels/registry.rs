//! # Channel registry: the runtime context.
//!
//! [`Runtime`] builds the four process-lifetime channels once, at startup, and
//! is then passed (or cloned) into every component that needs them. Clones
//! share the same channels.
//!
//! | channel  | capacity                  | producer          | consumer      |
//! |----------|---------------------------|-------------------|---------------|
//! | requests | 0 (rendezvous)            | application       | control loop  |
//! | events   | `Config::events_capacity` | control loop      | application   |
//! | activity | 1                         | host              | control loop  |
//! | sound    | 0 (rendezvous)            | control loop      | audio backend |
//!
//! The payload types are chosen by the embedder through [`Protocol`].
//! The sound receiver is handed to one audio backend per runtime, shared by
//! all clones.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::channels::{
    AudioBackend, EventReceiver, EventSender, RequestReceiver, RequestSender, SoundReceiver,
    SoundSender,
};
use crate::config::Config;
use crate::control::{FailureReporter, LoopInputs};
use crate::error::RuntimeError;
use crate::lifecycle::{ActivityBridge, ActivityHandle, ActivitySlot};
use crate::logging::Logger;

/// Payload types carried by a runtime's channels.
///
/// ```rust
/// use hostloop::Protocol;
///
/// enum Request { LoadTexture(String), FreeTexture(u32) }
/// enum Event { Created, Paused, Resumed, Destroyed }
/// enum Sound { Play(String), StopAll }
///
/// struct Game;
/// impl Protocol for Game {
///     type Request = Request;
///     type Event = Event;
///     type Sound = Sound;
/// }
/// ```
pub trait Protocol: Send + Sync + 'static {
    /// Resource-management commands sent by application code.
    type Request: Send + 'static;
    /// System and lifecycle events delivered to application code.
    type Event: Send + 'static;
    /// Requests forwarded to the audio backend.
    type Sound: Send + 'static;
}

/// Process-wide channel set plus the settings fixed at startup.
pub struct Runtime<P: Protocol> {
    cfg: Arc<Config>,
    logger: Logger,

    requests: (Sender<P::Request>, Receiver<P::Request>),
    events: (Sender<P::Event>, Receiver<P::Event>),
    activity: (Sender<ActivityHandle>, Receiver<ActivityHandle>),
    sound: (Sender<P::Sound>, Receiver<P::Sound>),
    audio_started: Arc<AtomicBool>,
}

impl<P: Protocol> Clone for Runtime<P> {
    fn clone(&self) -> Self {
        Self {
            cfg: Arc::clone(&self.cfg),
            logger: self.logger,
            requests: self.requests.clone(),
            events: self.events.clone(),
            activity: self.activity.clone(),
            sound: self.sound.clone(),
            audio_started: Arc::clone(&self.audio_started),
        }
    }
}

impl<P: Protocol> std::fmt::Debug for Runtime<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("cfg", &self.cfg)
            .field("pending_events", &self.events.1.len())
            .field("activity_pending", &!self.activity.1.is_empty())
            .finish()
    }
}

impl<P: Protocol> Runtime<P> {
    /// Builds the channel set.
    ///
    /// Fails only if `cfg` is invalid.
    pub fn new(cfg: Config) -> Result<Self, RuntimeError> {
        cfg.validate()?;
        let logger = Logger::from_config(&cfg);

        let rt = Self {
            requests: crossbeam_channel::bounded(0),
            events: crossbeam_channel::bounded(cfg.events_capacity),
            activity: crossbeam_channel::bounded(1),
            sound: crossbeam_channel::bounded(0),
            audio_started: Arc::new(AtomicBool::new(false)),
            cfg: Arc::new(cfg),
            logger,
        };
        crate::debugf!(
            rt.logger,
            "runtime channels ready (events_capacity={})",
            rt.cfg.events_capacity
        );
        Ok(rt)
    }

    /// Startup entry point: like [`Runtime::new`], but an invalid
    /// configuration terminates the process.
    pub fn init(cfg: Config) -> Self {
        let logger = Logger::from_config(&cfg);
        match Self::new(cfg) {
            Ok(rt) => rt,
            Err(err) => crate::fatalf!(logger, "hostloop startup failed: {err}"),
        }
    }

    /// Settings this runtime was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Logger carrying the startup switches.
    pub fn logger(&self) -> Logger {
        self.logger
    }

    /// Send-only handle for submitting resource requests.
    pub fn resource_manager(&self) -> RequestSender<P::Request> {
        RequestSender::new(self.requests.0.clone())
    }

    /// Receive-only handle for observing events.
    pub fn events(&self) -> EventReceiver<P::Event> {
        EventReceiver::new(self.events.1.clone())
    }

    /// Host-side entry point for delivering activity handles.
    pub fn lifecycle_bridge(&self) -> ActivityBridge {
        ActivityBridge::new(self.activity.0.clone(), self.logger)
    }

    /// Starts `backend` on its own thread, draining the sound channel.
    ///
    /// Only one backend may consume the channel: later calls, on this runtime
    /// or any clone, fail with [`RuntimeError::AudioAlreadyStarted`].
    pub fn spawn_audio<B>(&self, backend: B) -> Result<JoinHandle<()>, RuntimeError>
    where
        B: AudioBackend<P::Sound>,
    {
        if self.audio_started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AudioAlreadyStarted);
        }
        let sounds = SoundReceiver::new(self.sound.1.clone());
        let handle = thread::Builder::new()
            .name("hostloop-audio".to_string())
            .spawn(move || backend.run(sounds))
            .inspect_err(|_| self.audio_started.store(false, Ordering::Release))?;
        crate::debugf!(self.logger, "audio backend started");
        Ok(handle)
    }

    pub(crate) fn event_sender(&self) -> EventSender<P::Event> {
        EventSender::new(self.events.0.clone())
    }

    /// Assembles the inputs of one control-loop attempt.
    pub(crate) fn loop_inputs(&self, attempt: u32, failures: FailureReporter) -> LoopInputs<P> {
        LoopInputs {
            activity: ActivitySlot::new(self.activity.1.clone()),
            requests: RequestReceiver::new(self.requests.1.clone()),
            events: self.event_sender(),
            sound: SoundSender::new(self.sound.0.clone()),
            failures,
            attempt,
            logger: self.logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestProto;
    use std::time::Duration;

    #[test]
    fn accessors_return_handles_to_the_same_channels() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        assert!(rt.resource_manager().same_channel(&rt.resource_manager()));
        assert!(rt.events().same_channel(&rt.clone().events()));
        assert_eq!(rt.events().capacity(), Some(10));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = Config {
            events_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            Runtime::<TestProto>::new(cfg),
            Err(RuntimeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn channels_stay_connected_without_external_handles() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let rm = rt.resource_manager();
        // No loop running: the request is not serviced, but the channel is open.
        assert!(matches!(
            rm.send_timeout(1, Duration::from_millis(10)),
            Err(crate::SendTimeoutError::Timeout(1))
        ));
    }

    #[test]
    fn audio_backend_drains_sound_channel() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
        let _audio = rt
            .spawn_audio(move |sounds: SoundReceiver<&'static str>| {
                for s in sounds.iter() {
                    let _ = seen_tx.send(s);
                }
            })
            .unwrap();

        let (reporter, _records) = crate::control::failure_channel(1);
        let inputs = rt.loop_inputs(1, reporter);
        inputs.sound.send("beep").unwrap();
        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(1)).unwrap(), "beep");
    }

    #[test]
    fn second_audio_backend_is_rejected_across_clones() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
        let _audio = rt
            .spawn_audio(move |sounds: SoundReceiver<&'static str>| {
                for s in sounds.iter() {
                    let _ = seen_tx.send(("first", s));
                }
            })
            .unwrap();

        let rival = rt
            .clone()
            .spawn_audio(|sounds: SoundReceiver<&'static str>| {
                for _ in sounds.iter() {}
            });
        assert!(matches!(rival, Err(RuntimeError::AudioAlreadyStarted)));
        assert!(matches!(
            rt.spawn_audio(|_sounds: SoundReceiver<&'static str>| {}),
            Err(RuntimeError::AudioAlreadyStarted)
        ));

        let (reporter, _records) = crate::control::failure_channel(1);
        let inputs = rt.loop_inputs(1, reporter);
        for s in ["a", "b", "c"] {
            inputs.sound.send(s).unwrap();
        }
        let got: Vec<_> = (0..3)
            .map(|_| seen_rx.recv_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(got, [("first", "a"), ("first", "b"), ("first", "c")]);
    }
}

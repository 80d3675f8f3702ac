//! # Sound channel handles.
//!
//! Rendezvous channel between the control loop and the audio backend. The
//! backend runs on its own thread and is the only consumer.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, SendError, SendTimeoutError, Sender};

/// The audio collaborator that drains the sound channel.
///
/// Any `FnOnce(SoundReceiver<S>) + Send + 'static` closure qualifies.
pub trait AudioBackend<S>: Send + 'static {
    /// Consumes sound requests until the backend decides to stop.
    fn run(self, sounds: SoundReceiver<S>);
}

impl<S, F> AudioBackend<S> for F
where
    F: FnOnce(SoundReceiver<S>) + Send + 'static,
{
    fn run(self, sounds: SoundReceiver<S>) {
        self(sounds)
    }
}

/// Send handle used by the control loop to reach the audio backend.
#[derive(Debug)]
pub struct SoundSender<S> {
    tx: Sender<S>,
}

impl<S> Clone for SoundSender<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> SoundSender<S> {
    pub(crate) fn new(tx: Sender<S>) -> Self {
        Self { tx }
    }

    /// Hands `request` to the audio backend, blocking until it is taken.
    pub fn send(&self, request: S) -> Result<(), SendError<S>> {
        self.tx.send(request)
    }

    /// Like [`send`](Self::send) but gives up after `timeout`.
    pub fn send_timeout(&self, request: S, timeout: Duration) -> Result<(), SendTimeoutError<S>> {
        self.tx.send_timeout(request, timeout)
    }
}

/// Receive handle owned by the audio backend.
#[derive(Debug)]
pub struct SoundReceiver<S> {
    rx: Receiver<S>,
}

impl<S> SoundReceiver<S> {
    pub(crate) fn new(rx: Receiver<S>) -> Self {
        Self { rx }
    }

    /// Blocks until the control loop hands over a request.
    pub fn recv(&self) -> Result<S, RecvError> {
        self.rx.recv()
    }

    /// Blocks for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<S, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Blocking iterator over incoming requests.
    pub fn iter(&self) -> impl Iterator<Item = S> + '_ {
        self.rx.iter()
    }
}

//! # Request channel handles.
//!
//! The request channel is a rendezvous channel: a send completes only when the
//! control loop takes the value. [`RequestSender`] is the send-only view handed
//! to application code; [`RequestReceiver`] is the receive-only view handed to
//! the control loop.

use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvError, RecvTimeoutError, SendError, SendTimeoutError, Sender, TryRecvError,
    TrySendError,
};

/// Send-only handle to the request channel.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use hostloop::{Config, Protocol, Runtime, SendTimeoutError};
///
/// struct App;
/// impl Protocol for App {
///     type Request = &'static str;
///     type Event = ();
///     type Sound = ();
/// }
///
/// let rt = Runtime::<App>::new(Config::default()).unwrap();
/// let rm = rt.resource_manager();
///
/// // Nobody is receiving yet: the hand-off cannot complete.
/// let err = rm.send_timeout("load-texture", Duration::from_millis(10)).unwrap_err();
/// assert!(matches!(err, SendTimeoutError::Timeout("load-texture")));
/// ```
#[derive(Debug)]
pub struct RequestSender<R> {
    tx: Sender<R>,
}

impl<R> Clone for RequestSender<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R> RequestSender<R> {
    pub(crate) fn new(tx: Sender<R>) -> Self {
        Self { tx }
    }

    /// Hands `request` to the control loop, blocking until it is received.
    pub fn send(&self, request: R) -> Result<(), SendError<R>> {
        self.tx.send(request)
    }

    /// Like [`send`](Self::send) but gives up after `timeout`.
    pub fn send_timeout(&self, request: R, timeout: Duration) -> Result<(), SendTimeoutError<R>> {
        self.tx.send_timeout(request, timeout)
    }

    /// Succeeds only if the control loop is blocked receiving right now.
    pub fn try_send(&self, request: R) -> Result<(), TrySendError<R>> {
        self.tx.try_send(request)
    }

    /// True if both handles refer to the same channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// Receive-only handle to the request channel, owned by the control loop.
#[derive(Debug)]
pub struct RequestReceiver<R> {
    pub(crate) rx: Receiver<R>,
}

impl<R> RequestReceiver<R> {
    pub(crate) fn new(rx: Receiver<R>) -> Self {
        Self { rx }
    }

    /// Blocks until a request is handed over.
    pub fn recv(&self) -> Result<R, RecvError> {
        self.rx.recv()
    }

    /// Blocks for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<R, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Takes a request only if a sender is blocked handing one over.
    pub fn try_recv(&self) -> Result<R, TryRecvError> {
        self.rx.try_recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn pair() -> (RequestSender<u32>, RequestReceiver<u32>) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        (RequestSender::new(tx), RequestReceiver::new(rx))
    }

    #[test]
    fn send_stays_pending_until_received() {
        let (tx, rx) = pair();
        let done = Arc::new(AtomicBool::new(false));

        let sender = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                tx.send(7).unwrap();
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst), "send completed without a receiver");

        assert_eq!(rx.recv().unwrap(), 7);
        sender.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn try_send_fails_without_waiting_receiver() {
        let (tx, _rx) = pair();
        assert!(matches!(tx.try_send(1), Err(TrySendError::Full(1))));
        assert!(matches!(
            tx.send_timeout(2, Duration::from_millis(5)),
            Err(SendTimeoutError::Timeout(2))
        ));
    }

    #[test]
    fn order_is_preserved_per_sender() {
        let (tx, rx) = pair();
        let sender = thread::spawn(move || {
            for i in 0..5 {
                tx.send(i).unwrap();
            }
        });
        let got: Vec<u32> = (0..5).map(|_| rx.recv().unwrap()).collect();
        sender.join().unwrap();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }
}

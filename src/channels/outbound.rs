//! # Events channel handles.
//!
//! A bounded channel (10 slots by default). Sends complete immediately while
//! there is room and block once it is full. [`EventReceiver`] is the
//! receive-only view handed to application code; [`EventSender`] stays inside
//! the runtime and the control loop.

use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvError, RecvTimeoutError, SendError, SendTimeoutError, Sender, TryRecvError,
    TrySendError,
};

/// Receive-only handle to the events channel.
///
/// Several handles compete for events: each event is delivered to exactly one
/// receiver.
#[derive(Debug)]
pub struct EventReceiver<E> {
    rx: Receiver<E>,
}

impl<E> Clone for EventReceiver<E> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<E> EventReceiver<E> {
    pub(crate) fn new(rx: Receiver<E>) -> Self {
        Self { rx }
    }

    /// Blocks until an event is available.
    pub fn recv(&self) -> Result<E, RecvError> {
        self.rx.recv()
    }

    /// Blocks for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Takes a buffered event without blocking.
    pub fn try_recv(&self) -> Result<E, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drains currently buffered events without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = E> + '_ {
        self.rx.try_iter()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True when no event is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Buffer size of the channel.
    pub fn capacity(&self) -> Option<usize> {
        self.rx.capacity()
    }

    /// True if both handles refer to the same channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        self.rx.same_channel(&other.rx)
    }
}

/// Send handle to the events channel; many producers may hold one.
#[derive(Debug)]
pub struct EventSender<E> {
    tx: Sender<E>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventSender<E> {
    pub(crate) fn new(tx: Sender<E>) -> Self {
        Self { tx }
    }

    /// Buffers `event`, blocking while the channel is full.
    pub fn send(&self, event: E) -> Result<(), SendError<E>> {
        self.tx.send(event)
    }

    /// Like [`send`](Self::send) but gives up after `timeout`.
    pub fn send_timeout(&self, event: E, timeout: Duration) -> Result<(), SendTimeoutError<E>> {
        self.tx.send_timeout(event, timeout)
    }

    /// Buffers `event` only if there is room.
    pub fn try_send(&self, event: E) -> Result<(), TrySendError<E>> {
        self.tx.try_send(event)
    }

    /// True if no more events fit without blocking.
    pub fn is_full(&self) -> bool {
        self.tx.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn pair(cap: usize) -> (EventSender<u32>, EventReceiver<u32>) {
        let (tx, rx) = crossbeam_channel::bounded(cap);
        (EventSender::new(tx), EventReceiver::new(rx))
    }

    #[test]
    fn first_ten_sends_never_block() {
        let (tx, rx) = pair(10);
        for i in 0..10 {
            tx.try_send(i).unwrap();
        }
        assert!(tx.is_full());
        assert_eq!(rx.len(), 10);
        assert!(matches!(tx.try_send(10), Err(TrySendError::Full(10))));
    }

    #[test]
    fn eleventh_send_blocks_until_one_receive() {
        let (tx, rx) = pair(10);
        for i in 0..10 {
            tx.send(i).unwrap();
        }

        let done = Arc::new(AtomicBool::new(false));
        let sender = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                tx.send(10).unwrap();
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst), "11th send did not block");

        assert_eq!(rx.recv().unwrap(), 0);
        sender.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(rx.len(), 10);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn clones_share_one_channel() {
        let (tx, rx) = pair(2);
        let other = rx.clone();
        assert!(rx.same_channel(&other));
        tx.send(1).unwrap();
        assert_eq!(other.try_recv().unwrap(), 1);
        assert!(rx.is_empty());
        assert_eq!(rx.capacity(), Some(2));
    }
}

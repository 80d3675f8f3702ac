//! # Broadcast bus for supervision events.
//!
//! ```text
//! Publishers:                     Receivers:
//!   Supervisor ──┐
//!   Subscribers ─┴──► Bus ──┬──► subscriber listener ──► SubscriberSet
//!                           └──► SupervisorHandle::subscribe()
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - One shared ring buffer; lagging receivers skip the oldest events.
//! - Events published while nobody is subscribed are dropped.

use tokio::sync::broadcast;

use super::event::LoopEvent;

/// Broadcast channel for [`LoopEvent`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<LoopEvent>,
}

impl Bus {
    /// Creates a bus with the given ring capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<LoopEvent>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current receiver.
    pub fn publish(&self, ev: LoopEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LoopEventKind;

    #[tokio::test]
    async fn subscriber_sees_events_published_after_subscribe() {
        let bus = Bus::new(4);
        bus.publish(LoopEvent::new(LoopEventKind::LoopStarting));

        let mut rx = bus.subscribe();
        bus.publish(LoopEvent::new(LoopEventKind::LoopStopped).with_attempt(2));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, LoopEventKind::LoopStopped);
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(bus.receiver_count(), 1);
    }
}

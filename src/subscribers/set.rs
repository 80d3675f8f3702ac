//! # SubscriberSet: non-blocking fan-out
//!
//! ```text
//!    emit(&LoopEvent)
//!        ├──► [queue S1] ─► worker S1 ─► on_event()
//!        └──► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! - `emit` returns immediately; per-subscriber FIFO.
//! - A panicking subscriber is isolated; the panic is reported on the bus.
//! - A full or closed queue drops the event for that subscriber and reports
//!   `SubscriberOverflow` on the bus.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, LoopEvent};

use super::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<LoopEvent>>,
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<LoopEvent>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(panic.as_ref());
                        tracing::warn!(subscriber = name, %info, "subscriber panicked");
                        worker_bus.publish(LoopEvent::subscriber_panicked(name, info));
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Fans one event out to all subscribers without waiting.
    ///
    /// Overflow reports are not re-reported when they overflow themselves.
    pub fn emit(&self, event: &LoopEvent) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = channel.name, reason, "subscriber dropped event");
            if !event.is_subscriber_event() {
                self.bus
                    .publish(LoopEvent::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LoopEventKind;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedSender;

    struct Forward(UnboundedSender<LoopEventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, ev: &LoopEvent) {
            let _ = self.0.send(ev.kind);
        }
        fn name(&self) -> &'static str {
            "forward"
        }
    }

    struct Explodes;

    #[async_trait]
    impl Subscribe for Explodes {
        async fn on_event(&self, _ev: &LoopEvent) {
            panic!("subscriber blew up");
        }
        fn name(&self) -> &'static str {
            "explodes"
        }
    }

    #[tokio::test]
    async fn events_reach_every_subscriber_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let set = SubscriberSet::new(vec![Arc::new(Forward(tx))], Bus::new(8));
        assert_eq!(set.len(), 1);

        set.emit(&LoopEvent::new(LoopEventKind::LoopStarting));
        set.emit(&LoopEvent::new(LoopEventKind::LoopFailed));
        set.shutdown().await;

        assert_eq!(rx.recv().await, Some(LoopEventKind::LoopStarting));
        assert_eq!(rx.recv().await, Some(LoopEventKind::LoopFailed));
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_on_bus() {
        let bus = Bus::new(8);
        let mut bus_rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explodes)], bus);

        set.emit(&LoopEvent::new(LoopEventKind::LoopStarting));
        set.shutdown().await;

        let ev = bus_rx.recv().await.unwrap();
        assert_eq!(ev.kind, LoopEventKind::SubscriberPanicked);
        assert_eq!(ev.subscriber, Some("explodes"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let a: Box<dyn std::any::Any + Send> = Box::new("static");
        let b: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
        assert_eq!(panic_message(c.as_ref()), "unknown panic payload");
    }
}

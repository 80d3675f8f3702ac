//! # Builder for [`Supervisor`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::channels::{Protocol, Runtime};
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::state::LoopState;
use super::supervisor::Supervisor;

/// Builder for constructing a [`Supervisor`] with subscribers.
pub struct SupervisorBuilder<P: Protocol> {
    runtime: Runtime<P>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P: Protocol> SupervisorBuilder<P> {
    /// Creates a builder over `runtime`.
    pub fn new(runtime: Runtime<P>) -> Self {
        Self {
            runtime,
            subscribers: Vec::new(),
        }
    }

    /// Sets supervision event subscribers.
    ///
    /// Subscribers receive loop lifecycle events through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the supervisor.
    ///
    /// Spawns one worker task per subscriber, so with subscribers this must
    /// be called within a tokio runtime.
    pub fn build(self) -> Supervisor<P> {
        let bus = Bus::new(self.runtime.config().bus_capacity_clamped());
        let subs = Some(SubscriberSet::new(self.subscribers, bus.clone()));
        let (state, _) = watch::channel(LoopState::Starting);

        Supervisor {
            runtime: self.runtime,
            bus,
            subs,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::subscribers::LogWriter;
    use crate::test_support::TestProto;

    #[tokio::test]
    async fn build_starts_in_starting_state() {
        let rt = Runtime::<TestProto>::new(Config::default()).unwrap();
        let sup = SupervisorBuilder::new(rt)
            .subscriber(Arc::new(LogWriter::new()))
            .build();
        assert_eq!(*sup.state().borrow(), LoopState::Starting);
        assert_eq!(sup.subs.as_ref().map(SubscriberSet::len), Some(1));
    }
}

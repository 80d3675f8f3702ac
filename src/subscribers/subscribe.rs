//! # Subscriber trait
//!
//! Each subscriber is driven by its own worker task fed by a bounded queue
//! owned by [`SubscriberSet`](crate::subscribers::SubscriberSet). A slow
//! subscriber never blocks the supervisor or other subscribers; when its
//! queue is full, events for it are dropped.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use hostloop::{LoopEvent, LoopEventKind, Subscribe};
//!
//! struct CrashReporter;
//!
//! #[async_trait]
//! impl Subscribe for CrashReporter {
//!     async fn on_event(&self, ev: &LoopEvent) {
//!         if ev.kind == LoopEventKind::LoopTerminated {
//!             // upload ev.reason ...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "crash-reporter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::LoopEvent;

/// Contract for supervision event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &LoopEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}

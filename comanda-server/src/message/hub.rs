//! Kitchen broadcast hub
//!
//! # Delivery
//!
//! ```text
//! broadcast(event) ── serialize once ──▶ for each listener: try_send
//!                                          ├─ ok        → delivered
//!                                          └─ full/closed → collected
//!                                      after the pass: remove collected
//! ```
//!
//! Delivery never awaits, so a slow socket cannot stall the caller or the
//! other listeners. Messages are at-most-once; a dropped listener is not retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use shared::message::{KITCHEN_GROUP, KitchenEvent};
use tokio::sync::mpsc;

/// Default per-listener queue depth
pub const LISTENER_QUEUE: usize = 64;

/// Why a single delivery failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("listener queue is full")]
    Full,
    #[error("listener is gone")]
    Closed,
}

/// One connected receiver of kitchen events
pub trait Listener: Send + Sync {
    /// Non-blocking hand-off of an already serialized event
    fn deliver(&self, payload: Arc<str>) -> Result<(), DeliveryError>;
}

/// Listener backed by a bounded mpsc queue; the connection task drains the receiver
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelListener {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Listener for ChannelListener {
    fn deliver(&self, payload: Arc<str>) -> Result<(), DeliveryError> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Outcome of one broadcast pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// The "kitchen" group of connected listeners
#[derive(Clone)]
pub struct KitchenHub {
    members: Arc<DashMap<u64, Arc<dyn Listener>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for KitchenHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitchenHub")
            .field("group", &KITCHEN_GROUP)
            .field("members", &self.members.len())
            .finish()
    }
}

impl Default for KitchenHub {
    fn default() -> Self {
        Self::new()
    }
}

impl KitchenHub {
    pub fn new() -> Self {
        Self {
            members: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a listener and return its connection id
    pub fn join(&self, listener: Arc<dyn Listener>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.members.insert(id, listener);
        tracing::info!(connection_id = id, members = self.members.len(), "Kitchen listener joined");
        id
    }

    /// Remove a listener. `false` if it was already gone.
    pub fn leave(&self, id: u64) -> bool {
        let removed = self.members.remove(&id).is_some();
        if removed {
            tracing::info!(connection_id = id, members = self.members.len(), "Kitchen listener left");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Push an event to every member. Failed members are removed after the pass.
    pub fn broadcast(&self, event: &KitchenEvent) -> BroadcastReport {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(event = event.kind(), error = %e, "Failed to serialize kitchen event");
                return BroadcastReport::default();
            }
        };

        let mut failed = Vec::new();
        let mut delivered = 0;
        for member in self.members.iter() {
            match member.value().deliver(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(reason) => failed.push((*member.key(), reason)),
            }
        }

        for (id, reason) in &failed {
            self.members.remove(id);
            tracing::warn!(connection_id = id, reason = %reason, "Dropped kitchen listener");
        }

        tracing::debug!(
            event = event.kind(),
            delivered,
            dropped = failed.len(),
            "Kitchen event broadcast"
        );
        BroadcastReport { delivered, dropped: failed.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> KitchenEvent {
        KitchenEvent::OrderCancelled { order_id: 7 }
    }

    #[tokio::test]
    async fn every_member_receives_the_same_payload() {
        let hub = KitchenHub::new();
        let (a, mut rx_a) = ChannelListener::new(4);
        let (b, mut rx_b) = ChannelListener::new(4);
        hub.join(Arc::new(a));
        hub.join(Arc::new(b));

        let report = hub.broadcast(&event());
        assert_eq!(report, BroadcastReport { delivered: 2, dropped: 0 });

        let got_a = rx_a.recv().await.unwrap();
        let got_b = rx_b.recv().await.unwrap();
        assert_eq!(got_a, got_b);
        let json: serde_json::Value = serde_json::from_str(&got_a).unwrap();
        assert_eq!(json["type"], "order_cancelled");
        assert_eq!(json["order_id"], 7);
    }

    #[tokio::test]
    async fn dead_listener_is_removed_and_others_still_receive() {
        let hub = KitchenHub::new();
        let (alive, mut rx_alive) = ChannelListener::new(4);
        let (dead, rx_dead) = ChannelListener::new(4);
        hub.join(Arc::new(alive));
        let dead_id = hub.join(Arc::new(dead));
        drop(rx_dead);

        let report = hub.broadcast(&event());
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert_eq!(hub.len(), 1);
        assert!(!hub.leave(dead_id));
        assert!(rx_alive.recv().await.is_some());

        // not retried on the next pass
        let report = hub.broadcast(&event());
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 0 });
    }

    #[tokio::test]
    async fn full_queue_counts_as_failure() {
        let hub = KitchenHub::new();
        let (slow, _rx_slow) = ChannelListener::new(1);
        hub.join(Arc::new(slow));

        assert_eq!(hub.broadcast(&event()).delivered, 1);
        let report = hub.broadcast(&event());
        assert_eq!(report.dropped, 1);
        assert!(hub.is_empty());
    }

    #[test]
    fn leave_is_idempotent() {
        let hub = KitchenHub::new();
        let (l, _rx) = ChannelListener::new(1);
        let id = hub.join(Arc::new(l));
        assert!(hub.leave(id));
        assert!(!hub.leave(id));
        assert_eq!(hub.broadcast(&event()), BroadcastReport::default());
    }
}

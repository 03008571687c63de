//! IssueEventHub: fan-out of issue changes to push subscribers
//!
//! ```text
//! issue handlers (create / status / upvote)
//!       │ IssueUpdate
//!       ▼
//! IssueEventHub ── broadcast::Sender<IssueUpdate>
//!       │
//!       ▼
//! SSE handlers (one Receiver per open stream)
//! ```

use serde::Serialize;
use shared::event::{IssueEventType, IssueUpdate};
use tokio::sync::broadcast;

/// Enough to absorb a burst while a subscriber is mid-write
const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct IssueEventHub {
    tx: broadcast::Sender<IssueUpdate>,
}

impl Default for IssueEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueEventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IssueUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send to every open stream; returns how many received it
    pub fn publish(&self, update: IssueUpdate) -> usize {
        tracing::debug!(event = %update.kind, "Publishing issue event");
        // no subscribers is fine
        self.tx.send(update).unwrap_or(0)
    }

    /// Serialize `data` and publish it under `kind`
    pub fn publish_data<T: Serialize>(&self, kind: IssueEventType, data: &T) -> usize {
        match serde_json::to_value(data) {
            Ok(value) => self.publish(IssueUpdate::new(kind, value)),
            Err(e) => {
                tracing::error!(event = %kind, error = %e, "Failed to serialize issue event");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = IssueEventHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(
            hub.publish(IssueUpdate::new(IssueEventType::IssueCreated, json!({}))),
            0
        );
    }

    #[tokio::test]
    async fn test_fan_out() {
        let hub = IssueEventHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        let delivered = hub.publish_data(IssueEventType::IssueUpdated, &json!({"status": "resolved"}));
        assert_eq!(delivered, 2);

        for rx in [&mut a, &mut b] {
            let update = rx.recv().await.unwrap();
            assert_eq!(update.kind, IssueEventType::IssueUpdated);
            assert_eq!(update.data_str("status"), Some("resolved"));
            assert!(update.timestamp.is_some());
        }
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_released() {
        let hub = IssueEventHub::new();
        let rx = hub.subscribe();
        drop(rx);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber() {
        let hub = IssueEventHub::new();
        let mut rx = hub.subscribe();
        for i in 0..(BROADCAST_CAPACITY + 10) {
            hub.publish_data(IssueEventType::IssueUpvoted, &json!({"upvotes": i}));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(10))
        ));
        // the receiver keeps working after the lag
        assert!(rx.recv().await.is_ok());
    }
}

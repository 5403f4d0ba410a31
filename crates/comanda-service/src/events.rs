//! # Order Events
//!
//! A subscription hub for externally-observable order changes, built on
//! `tokio::sync::broadcast`. The environment's notification transport
//! (websocket push, long-poll bridge) subscribes here instead of polling
//! the store for new rows.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use comanda_core::OrderStatus;

/// Default buffer before slow subscribers start lagging.
const EVENT_CAPACITY: usize = 64;

/// Something observable happened to an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum OrderEvent {
    /// A new order was durably written.
    Created {
        order_id: String,
        order_number: String,
        total_cents: i64,
        status: OrderStatus,
    },
    /// An existing order changed status (settled, canceled).
    StatusChanged {
        order_id: String,
        status: OrderStatus,
    },
}

/// Broadcast hub for order events.
///
/// Cloning shares the underlying channel; every subscriber sees every
/// event published after it subscribed.
#[derive(Debug, Clone)]
pub struct OrderEvents {
    tx: broadcast::Sender<OrderEvent>,
}

impl OrderEvents {
    /// Creates a new hub with the default buffer.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        OrderEvents { tx }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event. Publishing with no subscribers is not an
    /// error; the event is simply dropped.
    pub fn publish(&self, event: OrderEvent) {
        trace!(?event, "Publishing order event");
        let _ = self.tx.send(event);
    }
}

impl Default for OrderEvents {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let events = OrderEvents::new();
        let mut rx = events.subscribe();

        events.publish(OrderEvent::Created {
            order_id: "o1".to_string(),
            order_number: "20260807-0001".to_string(),
            total_cents: 6380,
            status: OrderStatus::Completed,
        });

        match rx.try_recv().unwrap() {
            OrderEvent::Created {
                order_id,
                total_cents,
                ..
            } => {
                assert_eq!(order_id, "o1");
                assert_eq!(total_cents, 6380);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    /// The JSON shape the notification transport ships to the browser.
    #[test]
    fn test_event_json_shape() {
        let event = OrderEvent::StatusChanged {
            order_id: "o1".to_string(),
            status: OrderStatus::Completed,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["order_id"], "o1");
        assert_eq!(json["status"], "completed");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let events = OrderEvents::new();
        // No receiver: must not panic or error
        events.publish(OrderEvent::StatusChanged {
            order_id: "o1".to_string(),
            status: OrderStatus::Canceled,
        });
    }
}

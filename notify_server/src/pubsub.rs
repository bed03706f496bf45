//! Fan-out of detection events to every connected push client.
//!
use common::protocol::DetectionMsg;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Events buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// Detection as relayed to push clients, `message` is passed on as uploaded.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RelayedMsg {
    pub message: Value,
}

impl RelayedMsg {
    pub fn new(message: Value) -> Self {
        Self { message }
    }
}

impl From<DetectionMsg> for RelayedMsg {
    fn from(msg: DetectionMsg) -> Self {
        Self::new(Value::String(msg.message))
    }
}

pub type DetectionSender = broadcast::Sender<RelayedMsg>;
pub type DetectionReceiver = broadcast::Receiver<RelayedMsg>;

/// Broadcast hub between the ingestion endpoint and the event streams.
pub struct EventPubSub {
    tx: DetectionSender,
}

impl EventPubSub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send `msg` to all current subscribers and return how many were reached.
    pub fn publish(&self, msg: RelayedMsg) -> usize {
        match self.tx.send(msg) {
            Ok(receivers) => receivers,
            Err(_) => {
                log::debug!("Dropping event - probably no listener");
                0
            }
        }
    }

    pub fn subscribe(&self) -> DetectionReceiver {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let pubsub = EventPubSub::new();
        assert_eq!(pubsub.publish(DetectionMsg::new("nobody").into()), 0);
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let pubsub = EventPubSub::new();
        let mut rx_a = pubsub.subscribe();
        let mut rx_b = pubsub.subscribe();
        assert_eq!(pubsub.subscriber_count(), 2);

        let msg = RelayedMsg::from(DetectionMsg::for_label("Gallina"));
        assert_eq!(pubsub.publish(msg.clone()), 2);

        assert_eq!(rx_a.try_recv().unwrap(), msg);
        assert_eq!(rx_b.try_recv().unwrap(), msg);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let pubsub = EventPubSub::new();
        let _early = pubsub.subscribe();
        pubsub.publish(RelayedMsg::new(Value::Null));

        let mut late = pubsub.subscribe();
        assert!(late.try_recv().is_err());
    }
}

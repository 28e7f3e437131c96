//! In-process loopback ledger for tests and local demos.
//!
//! Stands in for the real gateway transport: two party endpoints, where a
//! pair published on one side is formatted as the contract's status event
//! and delivered to the other side's event subscription. Submission
//! succeeds even when the peer has stopped listening - a real ledger
//! accepts a transaction whether or not anyone is subscribed to its
//! events - so a party finishing first never fails its peer's final round.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parley_engine::{LedgerEvent, PublishError, UpdatePublisher};
use tokio::sync::mpsc;
use tracing::debug;

/// Buffered events per direction. Plenty for strict alternation; the
/// parties never have more than a couple of events in flight.
const EVENT_BUFFER: usize = 64;

/// One party's handle on the loopback ledger.
pub struct LoopbackEndpoint {
    /// Event name attached to updates this party emits.
    event_name: String,
    publisher: LoopbackPublisher,
    events: Option<mpsc::Receiver<LedgerEvent>>,
}

impl LoopbackEndpoint {
    /// Event name this party publishes under.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The outbound publish capability for this party.
    pub fn publisher(&self) -> LoopbackPublisher {
        self.publisher.clone()
    }

    /// Take the inbound subscription. Can only be taken once; the round
    /// loop owns it for the duration of the negotiation.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<LedgerEvent>> {
        self.events.take()
    }

    /// Fail the next `n` publish attempts from this party.
    pub fn inject_publish_failures(&self, n: u32) {
        self.publisher.fail_next.store(n, Ordering::SeqCst);
    }
}

/// Publisher half of a loopback endpoint.
#[derive(Clone)]
pub struct LoopbackPublisher {
    event_name: String,
    peer_tx: mpsc::Sender<LedgerEvent>,
    fail_next: Arc<AtomicU32>,
}

#[async_trait]
impl UpdatePublisher for LoopbackPublisher {
    async fn publish(&self, rate: &str, mismatch: &str) -> Result<(), PublishError> {
        if self.fail_next.load(Ordering::SeqCst) > 0 {
            self.fail_next.fetch_sub(1, Ordering::SeqCst);
            return Err(PublishError::Submission("injected failure".to_string()));
        }

        // The payload the contract would emit for this update.
        let payload = format!(
            "Update from {}: Lambda={rate}, Mismatch={mismatch}, end",
            self.event_name
        );
        let event = LedgerEvent::new(self.event_name.clone(), payload);

        if self.peer_tx.send(event).await.is_err() {
            // Peer unsubscribed; the transaction still went through.
            debug!(event = %self.event_name, "peer subscription closed, event dropped");
        }
        Ok(())
    }
}

/// Create a connected pair of endpoints.
///
/// Each name is the event name the respective party publishes under; what
/// one party publishes arrives on the other party's subscription.
pub fn pair(name_a: impl Into<String>, name_b: impl Into<String>) -> (LoopbackEndpoint, LoopbackEndpoint) {
    let name_a = name_a.into();
    let name_b = name_b.into();
    let (tx_to_a, rx_a) = mpsc::channel(EVENT_BUFFER);
    let (tx_to_b, rx_b) = mpsc::channel(EVENT_BUFFER);

    let a = LoopbackEndpoint {
        publisher: LoopbackPublisher {
            event_name: name_a.clone(),
            peer_tx: tx_to_b,
            fail_next: Arc::new(AtomicU32::new(0)),
        },
        event_name: name_a,
        events: Some(rx_a),
    };
    let b = LoopbackEndpoint {
        publisher: LoopbackPublisher {
            event_name: name_b.clone(),
            peer_tx: tx_to_a,
            fail_next: Arc::new(AtomicU32::new(0)),
        },
        event_name: name_b,
        events: Some(rx_b),
    };
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_engine::codec;

    #[tokio::test]
    async fn publish_reaches_peer_subscription() {
        let (a, mut b) = pair("Org1", "Org2");
        let mut b_events = b.take_events().unwrap();

        a.publisher().publish("1.5", "0.75").await.unwrap();

        let event = b_events.recv().await.unwrap();
        assert_eq!(event.name, "Org1");
        let obs = codec::decode_payload(&event.payload).unwrap();
        assert_eq!(obs.rate, 1.5);
        assert_eq!(obs.mismatch, 0.75);
    }

    #[tokio::test]
    async fn events_cannot_be_taken_twice() {
        let (mut a, _b) = pair("Org1", "Org2");
        assert!(a.take_events().is_some());
        assert!(a.take_events().is_none());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let (a, mut b) = pair("Org1", "Org2");
        let mut b_events = b.take_events().unwrap();
        a.inject_publish_failures(2);

        let publisher = a.publisher();
        assert!(publisher.publish("1", "1").await.is_err());
        assert!(publisher.publish("1", "1").await.is_err());
        assert!(publisher.publish("1", "1").await.is_ok());
        assert!(b_events.recv().await.is_some());
    }

    #[tokio::test]
    async fn publish_survives_peer_unsubscribing() {
        let (a, mut b) = pair("Org1", "Org2");
        drop(b.take_events());

        assert!(a.publisher().publish("1.5", "0.75").await.is_ok());
    }
}

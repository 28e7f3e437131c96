//! Post-negotiation replay listener.
//!
//! After the negotiation terminates a party can keep draining the event
//! stream, either to watch replayed history or to spot a sentinel update
//! from the peer. Unlike the negotiation phase, this listen is bounded: a
//! quiet stream ends it after an idle timeout.

use std::time::Duration;

use parley_engine::{codec, LedgerEvent, PeerObservation};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

/// Configuration for the replay listen phase.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Rate value that, once observed, ends the listen.
    pub sentinel_rate: f64,

    /// How long to wait without any event before giving up.
    pub idle_timeout: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sentinel_rate: 1.3456,
            idle_timeout: Duration::from_secs(1),
        }
    }
}

/// How the replay listen ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayEnd {
    /// The sentinel rate was observed; carries the full observation.
    Sentinel(PeerObservation),
    /// No event arrived within the idle timeout.
    Idle,
    /// The subscription closed.
    Closed,
}

/// Drain events until the sentinel rate appears, the stream goes idle, or
/// the subscription closes. Undecodable payloads are skipped.
pub async fn listen(
    events: &mut mpsc::Receiver<LedgerEvent>,
    config: &ReplayConfig,
) -> ReplayEnd {
    loop {
        let event = match timeout(config.idle_timeout, events.recv()).await {
            Err(_) => {
                info!("no more events, replay listen over");
                return ReplayEnd::Idle;
            }
            Ok(None) => return ReplayEnd::Closed,
            Ok(Some(event)) => event,
        };

        match codec::decode_payload(&event.payload) {
            Ok(obs) if obs.rate == config.sentinel_rate => {
                info!(rate = obs.rate, "sentinel update observed");
                return ReplayEnd::Sentinel(obs);
            }
            Ok(obs) => {
                debug!(event = %event.name, rate = obs.rate, mismatch = obs.mismatch, "replayed event");
            }
            Err(err) => {
                debug!(event = %event.name, error = %err, "skipping undecodable replayed event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_engine::codec::format_status;

    fn event(rate: f64, mismatch: f64) -> LedgerEvent {
        LedgerEvent::new("Org2", format_status(rate, mismatch))
    }

    #[tokio::test]
    async fn stops_on_sentinel() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(event(0.5, 0.1)).await.unwrap();
        tx.send(event(1.3456, 0.0)).await.unwrap();

        let end = listen(&mut rx, &ReplayConfig::default()).await;
        assert_eq!(
            end,
            ReplayEnd::Sentinel(PeerObservation {
                rate: 1.3456,
                mismatch: 0.0
            })
        );
    }

    #[tokio::test]
    async fn idles_out_on_quiet_stream() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(event(0.5, 0.1)).await.unwrap();

        let config = ReplayConfig {
            idle_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let end = listen(&mut rx, &config).await;
        assert_eq!(end, ReplayEnd::Idle);
    }

    #[tokio::test]
    async fn reports_closed_subscription() {
        let (tx, mut rx) = mpsc::channel::<LedgerEvent>(8);
        drop(tx);

        let end = listen(&mut rx, &ReplayConfig::default()).await;
        assert_eq!(end, ReplayEnd::Closed);
    }

    #[tokio::test]
    async fn skips_undecodable_events() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(LedgerEvent::new("Org2", "not a status message"))
            .await
            .unwrap();
        tx.send(event(1.3456, 0.0)).await.unwrap();

        let end = listen(&mut rx, &ReplayConfig::default()).await;
        assert!(matches!(end, ReplayEnd::Sentinel(_)));
    }
}

//! Parley node binary.
//!
//! Runs a two-party negotiation demonstration over the in-process
//! loopback ledger: both parties live in this process, wired so that each
//! one's published updates arrive as the other's peer events. A real
//! deployment would run one party per process against a gateway client
//! implementing the same publisher/subscription seams.

use parley_engine::{LoopOutcome, Negotiator, NegotiatorConfig, UpdatePublisher};
use parley_ledger::{loopback, LedgerConfig};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LedgerConfig::from_env();
    tracing::info!(
        channel = %config.channel,
        contract = %config.contract,
        event = %config.event_name,
        "Starting Parley node"
    );

    let (mut org1, mut org2) = loopback::pair("Org1", config.event_name.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let negotiator_config =
        NegotiatorConfig::default().with_publish_attempts(config.publish_attempts);

    let party_a = Negotiator::new(
        org1.take_events().expect("fresh endpoint"),
        org1.publisher(),
        shutdown_rx.clone(),
        negotiator_config.clone(),
    );
    let party_b = Negotiator::new(
        org2.take_events().expect("fresh endpoint"),
        org2.publisher(),
        shutdown_rx,
        negotiator_config,
    );

    // Party A opens the exchange with the protocol's initial state.
    org1.publisher().publish("0", "1.5").await?;

    let a_handle = tokio::spawn(party_a.run());
    let b_handle = tokio::spawn(party_b.run());

    for (party, handle) in [("Org1", a_handle), ("Org2", b_handle)] {
        match handle.await? {
            Ok(LoopOutcome::Converged(report)) => {
                tracing::info!(
                    party,
                    round = report.round,
                    rate = report.rate,
                    mismatch = report.mismatch,
                    decision = report.decision,
                    "negotiation done"
                );
            }
            Ok(LoopOutcome::Cancelled) => {
                tracing::info!(party, "negotiation cancelled before convergence");
            }
            Err(err) => {
                tracing::error!(party, error = %err, "negotiation failed");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

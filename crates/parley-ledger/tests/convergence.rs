//! Two-party negotiation over the loopback ledger.
//!
//! Wires two negotiators back to back: everything one party publishes
//! arrives as the other party's next peer event. From the protocol's
//! initial state the exchange is fully deterministic, so the final values
//! are asserted exactly.

use std::time::Duration;

use parley_engine::{LoopOutcome, Negotiator, NegotiatorConfig, UpdatePublisher};
use parley_ledger::loopback;
use tokio::sync::watch;
use tokio::time::timeout;

const INITIAL_RATE: &str = "0";
const INITIAL_MISMATCH: &str = "1.5";

#[tokio::test]
async fn two_parties_converge_to_the_same_operating_point() {
    let (mut org1, mut org2) = loopback::pair("Org1", "Org2");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let party_a = Negotiator::new(
        org1.take_events().unwrap(),
        org1.publisher(),
        shutdown_rx.clone(),
        NegotiatorConfig::default(),
    );
    let party_b = Negotiator::new(
        org2.take_events().unwrap(),
        org2.publisher(),
        shutdown_rx,
        NegotiatorConfig::default(),
    );

    // Party A opens the exchange by announcing its initial state; from
    // here on every publish is a reaction to a peer event.
    org1.publisher()
        .publish(INITIAL_RATE, INITIAL_MISMATCH)
        .await
        .unwrap();

    let a_handle = tokio::spawn(party_a.run());
    let b_handle = tokio::spawn(party_b.run());

    let a_outcome = timeout(Duration::from_secs(10), a_handle)
        .await
        .expect("party A did not finish")
        .unwrap()
        .unwrap();
    let b_outcome = timeout(Duration::from_secs(10), b_handle)
        .await
        .expect("party B did not finish")
        .unwrap()
        .unwrap();

    // The exchange is deterministic: A sees agreement one round before B,
    // and B confirms on A's final publish. Both settle on rate 2.25,
    // decision 1.125, zero residual mismatch.
    let LoopOutcome::Converged(a_report) = a_outcome else {
        panic!("party A did not converge: {a_outcome:?}");
    };
    let LoopOutcome::Converged(b_report) = b_outcome else {
        panic!("party B did not converge: {b_outcome:?}");
    };

    assert_eq!(a_report.round, 2);
    assert_eq!(b_report.round, 3);
    for report in [a_report, b_report] {
        assert_eq!(report.rate, 2.25);
        assert_eq!(report.mismatch, 0.0);
        assert_eq!(report.decision, 1.125);
        assert!(report.terminate);
    }
}

#[tokio::test]
async fn negotiation_survives_transient_publish_failures() {
    let (mut org1, mut org2) = loopback::pair("Org1", "Org2");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    // First two submission attempts from party B fail; with three
    // attempts per round the same pair goes through on the third.
    org2.inject_publish_failures(2);

    let party_a = Negotiator::new(
        org1.take_events().unwrap(),
        org1.publisher(),
        shutdown_rx.clone(),
        NegotiatorConfig::default().with_publish_attempts(3),
    );
    let party_b = Negotiator::new(
        org2.take_events().unwrap(),
        org2.publisher(),
        shutdown_rx,
        NegotiatorConfig::default().with_publish_attempts(3),
    );

    org1.publisher()
        .publish(INITIAL_RATE, INITIAL_MISMATCH)
        .await
        .unwrap();

    let a_handle = tokio::spawn(party_a.run());
    let b_handle = tokio::spawn(party_b.run());

    let a_outcome = timeout(Duration::from_secs(10), a_handle)
        .await
        .expect("party A did not finish")
        .unwrap()
        .unwrap();
    let b_outcome = timeout(Duration::from_secs(10), b_handle)
        .await
        .expect("party B did not finish")
        .unwrap()
        .unwrap();

    assert!(matches!(a_outcome, LoopOutcome::Converged(_)));
    assert!(matches!(b_outcome, LoopOutcome::Converged(_)));
}

#[tokio::test]
async fn exhausted_publish_attempts_abort_the_party() {
    let (mut org1, mut org2) = loopback::pair("Org1", "Org2");
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    // More failures than attempts: party B's first round publish is fatal.
    org2.inject_publish_failures(5);

    let party_b = Negotiator::new(
        org2.take_events().unwrap(),
        org2.publisher(),
        shutdown_rx,
        NegotiatorConfig::default().with_publish_attempts(2),
    );

    org1.publisher()
        .publish(INITIAL_RATE, INITIAL_MISMATCH)
        .await
        .unwrap();

    let err = timeout(Duration::from_secs(10), party_b.run())
        .await
        .expect("party B did not finish")
        .unwrap_err();
    assert!(matches!(err, parley_engine::Error::Publish(_)));
}

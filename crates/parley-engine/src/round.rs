//! The round loop: waits for peer events, applies the update rule, and
//! publishes the new local state until the negotiation converges.
//!
//! The loop is the single consumer of the inbound subscription and the
//! sole owner of the [`NegotiationState`]. Every publish is a direct
//! reaction to exactly one inbound event, so the two parties strictly
//! alternate. The wait for peer activity has no timeout; it is a
//! cancellable select over the next event and an operator shutdown signal.
//! Once a round has started it always runs to completion — cancellation
//! is only observed between rounds, so a partial update can never leave
//! the rate/mismatch pair half-advanced.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::ledger::{LedgerEvent, UpdatePublisher};
use crate::state::{NegotiationState, RoundReport};
use crate::update;

/// Phase of the round loop, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Suspended, waiting for the next peer event or shutdown.
    AwaitingEvent,
    /// Decoding the event and applying the update rule.
    Updating,
    /// Submitting the freshly computed pair to the ledger.
    Publishing,
    /// Converged and published the final pair; the loop has exited.
    Terminated,
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingEvent => write!(f, "AwaitingEvent"),
            Self::Updating => write!(f, "Updating"),
            Self::Publishing => write!(f, "Publishing"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// How a finished loop ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopOutcome {
    /// The update rule signalled convergence and the final pair was
    /// published. Carries the final round's report.
    Converged(RoundReport),
    /// Operator-requested shutdown before convergence.
    Cancelled,
}

/// Configuration for a [`Negotiator`].
#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
    /// Total publish attempts per round before the failure is fatal.
    /// Retries resend the same already-computed values.
    pub publish_attempts: u32,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            publish_attempts: 3,
        }
    }
}

impl NegotiatorConfig {
    /// Set the total number of publish attempts per round.
    #[must_use]
    pub fn with_publish_attempts(mut self, attempts: u32) -> Self {
        self.publish_attempts = attempts.max(1);
        self
    }
}

/// Drives one party's side of the negotiation to completion.
pub struct Negotiator<P: UpdatePublisher> {
    events: mpsc::Receiver<LedgerEvent>,
    publisher: P,
    shutdown: watch::Receiver<bool>,
    config: NegotiatorConfig,
    state: NegotiationState,
    report_tx: watch::Sender<RoundReport>,
}

impl<P: UpdatePublisher> Negotiator<P> {
    /// Create a negotiator at the protocol's initial state.
    ///
    /// `events` is the inbound subscription (already filtered to this
    /// party's event name by the collaborator); `shutdown` flips to `true`
    /// when the operator requests cancellation.
    pub fn new(
        events: mpsc::Receiver<LedgerEvent>,
        publisher: P,
        shutdown: watch::Receiver<bool>,
        config: NegotiatorConfig,
    ) -> Self {
        let (report_tx, _) = watch::channel(RoundReport::initial());
        Self {
            events,
            publisher,
            shutdown,
            config,
            state: NegotiationState::initial(),
            report_tx,
        }
    }

    /// Subscribe to per-round report snapshots.
    ///
    /// Observers get a copy after each completed round; mid-round they see
    /// the previous round's report.
    pub fn reports(&self) -> watch::Receiver<RoundReport> {
        self.report_tx.subscribe()
    }

    /// Run the loop until convergence, cancellation, or a fatal error.
    ///
    /// The inbound subscription is released on every exit path (the
    /// receiver is owned by the loop and dropped with it).
    pub async fn run(mut self) -> Result<LoopOutcome> {
        loop {
            debug!(phase = %LoopPhase::AwaitingEvent, round = self.state.round, "waiting for peer event");

            let event = tokio::select! {
                changed = self.shutdown.changed() => {
                    // A dropped shutdown sender means the operator side is
                    // gone; treat it the same as an explicit shutdown.
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(round = self.state.round, "negotiation cancelled");
                        return Ok(LoopOutcome::Cancelled);
                    }
                    continue;
                }
                event = self.events.recv() => {
                    event.ok_or(Error::SubscriptionClosed)?
                }
            };

            match self.run_round(&event).await? {
                Some(report) if report.terminate => {
                    info!(
                        round = report.round,
                        rate = report.rate,
                        mismatch = report.mismatch,
                        decision = report.decision,
                        "negotiation converged"
                    );
                    return Ok(LoopOutcome::Converged(report));
                }
                _ => {}
            }
        }
    }

    /// Execute one round against a received event.
    ///
    /// Returns `Ok(None)` when the round was abandoned because the payload
    /// did not decode. The round index still advances in that case; it only
    /// feeds step-size decay.
    async fn run_round(&mut self, event: &LedgerEvent) -> Result<Option<RoundReport>> {
        self.state.round += 1;
        let round = self.state.round;
        debug!(phase = %LoopPhase::Updating, round, event = %event.name, "processing peer event");

        let peer = match codec::decode_payload(&event.payload) {
            Ok(peer) => peer,
            Err(err) => {
                warn!(round, error = %err, "abandoning round: undecodable peer payload");
                return Ok(None);
            }
        };

        let outcome = update::advance(&self.state, &peer, round)?;

        // Rate and mismatch advance together; the peer's convergence test
        // depends on seeing the pair from the same round.
        self.state.rate = outcome.rate;
        self.state.mismatch = outcome.mismatch;
        self.state.decision = outcome.decision;

        debug!(phase = %LoopPhase::Publishing, round, "publishing update");
        let rate_text = outcome.rate.to_string();
        let mismatch_text = outcome.mismatch.to_string();
        self.publish_with_retry(&rate_text, &mismatch_text).await?;

        let report = RoundReport {
            round,
            rate: outcome.rate,
            mismatch: outcome.mismatch,
            decision: outcome.decision,
            terminate: outcome.terminate,
        };
        self.report_tx.send_replace(report);
        info!(
            round,
            rate = report.rate,
            mismatch = report.mismatch,
            decision = report.decision,
            terminate = report.terminate,
            "round complete"
        );

        Ok(Some(report))
    }

    /// Publish the already-computed pair, retrying the identical values up
    /// to the configured attempt count.
    ///
    /// By the time this runs the in-memory state has advanced, so a retry
    /// must never recompute — that would double-step the negotiation.
    async fn publish_with_retry(&self, rate: &str, mismatch: &str) -> Result<()> {
        let attempts = self.config.publish_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.publisher.publish(rate, mismatch).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(attempt, attempts, error = %err, "publish attempt failed");
                    last_err = Some(err);
                }
            }
        }
        // attempts >= 1, so last_err is set here.
        Err(Error::Publish(last_err.unwrap_or(
            crate::error::PublishError::Unavailable,
        )))
    }
}

//! The per-round update rule and termination test.
//!
//! Each round averages the local and peer rates, nudged by the local
//! mismatch with a step size that decays as `1/round` down to a floor of
//! 0.05 — the step shrinks across rounds but never vanishes, trading
//! convergence speed against stability. The decision is the rate halved
//! and clamped to its fixed domain; the mismatch update then measures how
//! much the averaging and clamping perturbed the operating point.
//!
//! Everything here is total, deterministic, and side-effect free over f64,
//! except that a round index of 0 is rejected (it is a divisor).

use crate::error::{Error, Result};
use crate::state::{NegotiationState, PeerObservation, DECISION_MAX, DECISION_MIN};

/// Floor for the diminishing step size.
pub const STEP_FLOOR: f64 = 0.05;

/// Convergence tolerance on the residual mismatch.
pub const MISMATCH_TOLERANCE: f64 = 0.05;

/// Convergence tolerance on the rate movement between rounds.
pub const RATE_TOLERANCE: f64 = 0.05;

/// Result of applying the update rule for one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundOutcome {
    pub rate: f64,
    pub mismatch: f64,
    pub decision: f64,
    pub terminate: bool,
}

/// Step size for the given round: `max(1/round, 0.05)`.
///
/// Exactly 0.05 for every round >= 20.
pub fn step_size(round: u64) -> Result<f64> {
    if round == 0 {
        return Err(Error::InvalidRoundIndex { round });
    }
    Ok((1.0 / round as f64).max(STEP_FLOOR))
}

/// Clamp a raw decision value into the fixed decision domain.
///
/// Idempotent: clamping an already-clamped value returns it unchanged.
pub fn clamp_decision(raw: f64) -> f64 {
    raw.clamp(DECISION_MIN, DECISION_MAX)
}

/// Compute the next-round state from the current state and the peer's
/// observation, and decide whether the negotiation has converged.
///
/// `round` is the index of the round being computed and must be >= 1.
pub fn advance(
    state: &NegotiationState,
    peer: &PeerObservation,
    round: u64,
) -> Result<RoundOutcome> {
    let step = step_size(round)?;

    let rate = 0.5 * state.rate + 0.5 * peer.rate + step * state.mismatch;
    let decision = clamp_decision(rate / 2.0);
    // Prior decision minus the new one: how far the clamp/averaging step
    // moved the operating point this round.
    let mismatch = 0.5 * state.mismatch + 0.5 * peer.mismatch + state.decision - decision;

    // Both conjuncts are required. Mismatch alone can be momentarily small
    // while the rate is still moving.
    let terminate =
        mismatch.abs() < MISMATCH_TOLERANCE && (rate - state.rate).abs() < RATE_TOLERANCE;

    Ok(RoundOutcome {
        rate,
        mismatch,
        decision,
        terminate,
    })
}

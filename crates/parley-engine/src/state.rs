//! Negotiation state held across rounds.
//!
//! The [`NegotiationState`] is owned exclusively by the round loop and is
//! replaced wholesale at the end of each completed round. `rate` and
//! `mismatch` always advance together as a pair: the peer's convergence
//! test depends on both, so a round never publishes one without the other.

use serde::{Deserialize, Serialize};

/// Initial mismatch value at loop start.
pub const INITIAL_MISMATCH: f64 = 1.5;

/// Lower bound of the decision domain.
pub const DECISION_MIN: f64 = 0.0;

/// Upper bound of the decision domain.
pub const DECISION_MAX: f64 = 8.0;

/// The local party's authoritative negotiation record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationState {
    /// Current proposed rate (the decision variable under negotiation).
    pub rate: f64,
    /// Current disagreement measure against the peer's values.
    pub mismatch: f64,
    /// Operating point implied by `rate`, always clamped to
    /// [`DECISION_MIN`, `DECISION_MAX`].
    pub decision: f64,
    /// Rounds completed or abandoned so far. 0 before any peer event;
    /// increments by exactly 1 per observed event, never reset.
    pub round: u64,
}

impl NegotiationState {
    /// State at loop start, before any peer event has been observed.
    pub fn initial() -> Self {
        Self {
            rate: 0.0,
            mismatch: INITIAL_MISMATCH,
            decision: 0.0,
            round: 0,
        }
    }
}

impl Default for NegotiationState {
    fn default() -> Self {
        Self::initial()
    }
}

/// The peer's most recently announced `(rate, mismatch)` pair.
///
/// Ephemeral: decoded from one inbound event, folded into the update rule,
/// then discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerObservation {
    pub rate: f64,
    pub mismatch: f64,
}

/// Snapshot of a completed round, exposed for observation.
///
/// Published on a watch channel after every completed round; observers see
/// a point-in-time copy and never touch the loop's own state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u64,
    pub rate: f64,
    pub mismatch: f64,
    pub decision: f64,
    pub terminate: bool,
}

impl RoundReport {
    /// Report for round zero, before any peer event.
    pub fn initial() -> Self {
        let state = NegotiationState::initial();
        Self {
            round: 0,
            rate: state.rate,
            mismatch: state.mismatch,
            decision: state.decision,
            terminate: false,
        }
    }
}

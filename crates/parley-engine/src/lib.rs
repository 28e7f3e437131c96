//! Parley engine - one party's side of a two-party iterative negotiation
//! run over a shared ledger.
//!
//! The parties coordinate solely through asynchronous event notifications:
//! each inbound peer event carries the peer's `(rate, mismatch)` pair, the
//! [`update`] rule folds it into the local [`state`], and the new pair is
//! published back as a ledger transaction. The exchange strictly
//! alternates and stops when both the residual mismatch and the rate
//! movement fall under tolerance.
//!
//! Everything around the engine - credential provisioning, transport
//! setup, gateway connection - belongs to the ledger-client collaborator,
//! which attaches at the seams in [`ledger`].

pub mod codec;
pub mod error;
pub mod ledger;
pub mod round;
pub mod state;
pub mod update;

pub use error::{DecodeError, Error, PublishError, Result};
pub use ledger::{LedgerEvent, UpdatePublisher};
pub use round::{LoopOutcome, LoopPhase, Negotiator, NegotiatorConfig};
pub use state::{NegotiationState, PeerObservation, RoundReport};
pub use update::{advance, clamp_decision, step_size, RoundOutcome};

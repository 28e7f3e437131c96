//! Error types for parley-engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a negotiation.
#[derive(Debug, Error)]
pub enum Error {
    /// The peer's status payload could not be decoded.
    ///
    /// Recoverable at the round boundary: the round is abandoned and the
    /// loop waits for the next event.
    #[error("failed to decode peer status: {0}")]
    Decode(#[from] DecodeError),

    /// The update rule was invoked with a round index of zero.
    ///
    /// The round index is a divisor in the step-size computation, so this
    /// is an invariant violation, not an expected runtime condition.
    #[error("invalid round index {round}: must be >= 1")]
    InvalidRoundIndex { round: u64 },

    /// Publishing the local update failed after all retry attempts.
    #[error("failed to publish update: {0}")]
    Publish(#[from] PublishError),

    /// The inbound event subscription closed while the loop was still
    /// waiting for peer activity.
    #[error("event subscription closed before negotiation completed")]
    SubscriptionClosed,
}

/// Errors from parsing a peer status payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload was empty.
    #[error("empty payload")]
    EmptyPayload,

    /// The payload was not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    /// A required field marker was not found in the payload.
    #[error("marker {marker:?} not found in payload")]
    MissingMarker { marker: &'static str },

    /// The text captured after a marker did not parse as a number.
    #[error("field {field:?} is not a valid number: {text:?}")]
    InvalidNumber { field: &'static str, text: String },
}

/// Errors from the outbound publish capability.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The ledger collaborator rejected or failed the submission.
    #[error("submission failed: {0}")]
    Submission(String),

    /// The collaborator is gone (channel closed, connection dropped).
    #[error("publish channel unavailable")]
    Unavailable,
}

//! The two capabilities the round loop consumes from its ledger-client
//! collaborator: an ordered inbound event subscription and an outbound
//! update-submission operation.
//!
//! Both are owned and lifecycle-managed by the collaborator. The loop takes
//! the subscription receiver by value and drops it on every exit path, and
//! holds the publisher only for the duration of the negotiation.

use async_trait::async_trait;

use crate::error::PublishError;

/// One notification delivered by the ledger's event channel.
///
/// The loop reads `payload` as UTF-8 status text; `name` is used only for
/// routing and filtering by the collaborator.
#[derive(Debug, Clone)]
pub struct LedgerEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

impl LedgerEvent {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Outbound submission capability.
///
/// Implementations submit the local party's `(rate, mismatch)` update as a
/// ledger transaction. Arguments are canonical decimal strings produced by
/// the loop's formatter; a retried publish receives the exact same strings.
#[async_trait]
pub trait UpdatePublisher: Send + Sync {
    async fn publish(&self, rate: &str, mismatch: &str) -> Result<(), PublishError>;
}

#[async_trait]
impl<P: UpdatePublisher + ?Sized> UpdatePublisher for std::sync::Arc<P> {
    async fn publish(&self, rate: &str, mismatch: &str) -> Result<(), PublishError> {
        (**self).publish(rate, mismatch).await
    }
}

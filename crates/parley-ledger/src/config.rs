//! Ledger-client configuration.
//!
//! Channel, contract, and event names were compile-time constants in older
//! deployments; here they are explicit configuration read once at startup
//! and handed to the collaborator. Nothing in the engine sees them.

/// Configuration for one party's ledger client.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Ledger channel the negotiation runs on.
    pub channel: String,

    /// Name of the deployed negotiation contract.
    pub contract: String,

    /// Event name this party listens for (the peer's announcements).
    pub event_name: String,

    /// Total publish attempts per round before giving up.
    pub publish_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LedgerConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let channel =
            std::env::var("PARLEY_CHANNEL").unwrap_or_else(|_| "mychannel".to_string());

        let contract =
            std::env::var("PARLEY_CONTRACT").unwrap_or_else(|_| "basic".to_string());

        let event_name =
            std::env::var("PARLEY_EVENT").unwrap_or_else(|_| "Org2".to_string());

        let publish_attempts = std::env::var("PARLEY_PUBLISH_RETRIES")
            .map(|s| s.parse().expect("Invalid PARLEY_PUBLISH_RETRIES"))
            .unwrap_or(3);

        Self {
            channel,
            contract,
            event_name,
            publish_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        for var in [
            "PARLEY_CHANNEL",
            "PARLEY_CONTRACT",
            "PARLEY_EVENT",
            "PARLEY_PUBLISH_RETRIES",
        ] {
            std::env::remove_var(var);
        }
        let config = LedgerConfig::from_env();
        assert_eq!(config.channel, "mychannel");
        assert_eq!(config.contract, "basic");
        assert_eq!(config.event_name, "Org2");
        assert_eq!(config.publish_attempts, 3);
    }
}

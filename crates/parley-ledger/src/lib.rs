//! Ledger-client collaborator surface for the Parley engine.
//!
//! The engine only asks for an event subscription and a publish
//! capability; this crate supplies them. [`loopback`] wires two in-process
//! parties together for tests and local demos, [`config`] carries the
//! channel/contract/event names a real gateway client would need, and
//! [`replay`] is the bounded post-negotiation listen phase. A production
//! gateway transport would implement [`parley_engine::UpdatePublisher`]
//! and feed the same [`parley_engine::LedgerEvent`] channel.

pub mod config;
pub mod loopback;
pub mod replay;

pub use config::LedgerConfig;
pub use loopback::{pair, LoopbackEndpoint, LoopbackPublisher};
pub use replay::{listen, ReplayConfig, ReplayEnd};

//! Error types for the playwatch domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Transport faults are `Clone` because they are delivered as items inside
//! subscription channels, not just returned from calls.

use thiserror::Error;

/// The top-level error type for all playwatch operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A fault on the wire between playwatch and a remote property holder.
///
/// Every subscription yields `Result<_, TransportError>` items, so a fault
/// reaches the consumer in-band, terminates that one stream, and leaves
/// sibling streams running.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Read of {property} failed: {reason}")]
    Read { property: String, reason: String },

    #[error("Subscription failed: {0}")]
    Subscribe(String),
}

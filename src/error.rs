//! Error types for the address cache
//!
//! Provides unified error handling using thiserror. Routine outcomes such as a
//! full or empty cache are returned as plain values, not as errors.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the address cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Rejected configuration (zero capacity, zero sweep interval with a TTL)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Expiry requested but no tokio runtime is available to run the sweeper
    #[error("Runtime unavailable: {0}")]
    Runtime(String),

    /// A pending take was cancelled before an address became available
    #[error("Take cancelled")]
    Cancelled,

    /// Text could not be parsed as an address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

// == Result Type Alias ==
/// Convenience Result type for the address cache.
pub type Result<T> = std::result::Result<T, CacheError>;

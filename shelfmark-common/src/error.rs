//! Common error types for Shelfmark

use thiserror::Error;

/// Common result type for Shelfmark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Shelfmark crates
#[derive(Error, Debug)]
pub enum Error {
    /// The persistent store's connection handle is no longer valid.
    /// Callers surface a user-visible notice and abort without writing.
    #[error("Persistent store is unavailable")]
    StoreUnavailable,

    /// Transient store operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network fetch failed (transport error or non-success status)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

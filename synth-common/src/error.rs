//! Common error types for the synth tooling

use thiserror::Error;

/// Common result type for synth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by every synth crate
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

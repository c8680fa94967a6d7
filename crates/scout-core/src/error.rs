//! Error types for scout-core

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias using scout-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scout-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store error
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

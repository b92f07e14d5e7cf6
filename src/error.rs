//! Trackerlink error types

use thiserror::Error;

/// Trackerlink error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings store error
    #[error("Settings store error: {0}")]
    Store(String),

    /// Remote tracker error (connection, TLS, rejected login)
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Trackerlink operations
pub type Result<T> = std::result::Result<T, Error>;

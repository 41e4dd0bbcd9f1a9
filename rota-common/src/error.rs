//! Common error types for the rota workspace
//!
//! Every variant here is dataset-level: it aborts a run before any output is
//! produced. Row-level problems are never raised as `Error`; they are
//! collected as validation issues and reported alongside the output.

use thiserror::Error;

/// Common result type for rota operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error types shared across rota crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw schedule source could not be read
    #[error("Source error: {0}")]
    Source(String),

    /// Alias table could not be read or is malformed
    #[error("Alias source error: {0}")]
    AliasSource(String),

    /// Output sink rejected a write
    #[error("Sink error: {0}")]
    Sink(String),

    /// Pipeline run state could not be read or persisted
    #[error("State store error: {0}")]
    StateStore(String),

    /// Invalid caller input (bad range descriptor, unknown field, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable code for summaries and exit diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Source(_) => "SOURCE_ERROR",
            Error::AliasSource(_) => "ALIAS_SOURCE_ERROR",
            Error::Sink(_) => "SINK_ERROR",
            Error::StateStore(_) => "STATE_STORE_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

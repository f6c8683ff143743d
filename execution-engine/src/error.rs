use crate::validator::Rejection;
use std::path::PathBuf;
use thiserror::Error;

/// Global error type for the execution engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to load or deserialize configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Underlying IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open feed file {path}: {source}")]
    Feed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse a JSON document (order requests, snapshots).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A feed references an instrument the account does not know.
    #[error("Feed configured for unknown instrument '{0}'")]
    UnknownInstrument(String),

    /// The submission failed validation. Nothing reached the ledger.
    #[error("Order rejected: {0}")]
    Rejected(Rejection),

    /// The account worker has stopped and no longer accepts commands.
    #[error("Account worker '{0}' is not running")]
    WorkerGone(String),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

//! Error types for seekfs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeekError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A crawl root is missing or cannot be listed. Fatal for the whole crawl.
    #[error("Root path unavailable: {root}: {source}")]
    RootUnavailable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported {kind} format version {found} (expected {expected})")]
    SchemaVersion {
        kind: String,
        found: u32,
        expected: u32,
    },

    /// An embedding batch failed. The first `committed` names are indexed;
    /// re-submit the rest to finish.
    #[error("Embedding build stopped after {committed}/{total} names: {reason}")]
    PartialBuild {
        committed: usize,
        total: usize,
        reason: String,
    },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Query expansion error: {0}")]
    Expansion(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SeekError>;

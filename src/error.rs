//! Error types for txkv
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using TxkvError
pub type Result<T> = std::result::Result<T, TxkvError>;

/// Unified error type for txkv operations
#[derive(Debug, Error)]
pub enum TxkvError {
    // -------------------------------------------------------------------------
    // Validation Errors (rejected before any write)
    // -------------------------------------------------------------------------
    #[error("key size {size} exceeds maximum of {max} bytes")]
    KeyTooLarge { size: usize, max: usize },

    #[error("value size {size} exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Transaction Log I/O Errors
    // -------------------------------------------------------------------------
    #[error("failed to open transaction log {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("append to transaction log failed: {0}")]
    AppendFailed(#[source] std::io::Error),

    #[error("sync of transaction log failed: {0}")]
    SyncFailed(#[source] std::io::Error),

    #[error("close of transaction log failed: {0}")]
    CloseFailed(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Decoding Errors
    // -------------------------------------------------------------------------
    #[error("log corruption at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Service Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl TxkvError {
    /// Whether this error was raised by size validation rather than I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::KeyTooLarge { .. } | Self::ValueTooLarge { .. })
    }
}

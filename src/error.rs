//! Record store error types.

use std::path::PathBuf;

/// Errors raised by write paths of the order store.
///
/// Read paths never return these: an unreadable history is reported as empty.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to move {tmp} into place at {path}: {source}")]
    Replace {
        tmp: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("history file {path} is corrupt, refusing to overwrite it: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("history lock poisoned")]
    Poisoned,
}

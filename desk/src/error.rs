//! Error types for the order desk.

use std::path::PathBuf;

use orderdesk::{BrokerOrderId, StoreError};
use orderdesk_broker::BrokerError;
use orderdesk_risk::ValidationReport;

/// All errors that can occur during order desk operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("validation failed: {}", .0.summary())]
    Validation(ValidationReport),

    #[error("IBKR connection error: {0}")]
    Connection(String),

    #[error("instrument not found: {0}")]
    InstrumentNotFound(String),

    /// The gateway refused or lost the order. The attempt is already in
    /// history as `record_id`.
    #[error("submission failed (recorded as order #{record_id}): {message}")]
    Submission { record_id: u64, message: String },

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("order history error: {0}")]
    Storage(#[from] StoreError),

    #[error("order {0} is not in the live pending set")]
    NotFound(BrokerOrderId),

    #[error("order #{0} not found in history")]
    RecordNotFound(u64),

    #[error("order #{record_id} cannot be cancelled: {reason}")]
    NotCancellable { record_id: u64, reason: String },

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl From<BrokerError> for Error {
    fn from(e: BrokerError) -> Self {
        match e {
            BrokerError::InstrumentNotFound(what) => Error::InstrumentNotFound(what),
            e if e.is_connection() => Error::Connection(e.to_string()),
            e => Error::Gateway(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

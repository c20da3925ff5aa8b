//! Broker error types.

/// Errors that can occur during gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("session id {0} is already connected")]
    DuplicateSession(i32),

    #[error("instrument not found: {0}")]
    InstrumentNotFound(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("not connected")]
    NotConnected,

    #[error("{0}")]
    Other(String),
}

impl BrokerError {
    /// True for failures that happen before a session exists.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            BrokerError::Connection(_) | BrokerError::DuplicateSession(_) | BrokerError::NotConnected
        )
    }
}

//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("token store error: {0}")]
    Token(String),

    #[error("{0}")]
    Other(String),
}

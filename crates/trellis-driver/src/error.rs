//! Error types for the driver abstraction.

use thiserror::Error;

/// Errors raised by a driver while executing statements or managing the
/// connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The connection to the back-end failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The back-end rejected a statement.
    #[error("statement failed: {0}")]
    Statement(String),

    /// An operation was attempted on a closed session.
    #[error("driver session is closed")]
    SessionClosed,

    /// An operation was attempted on a closed transaction.
    #[error("driver transaction is closed")]
    TransactionClosed,

    /// A streamed record did not have the expected shape.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

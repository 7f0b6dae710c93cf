//! Error types for the session layer.

use thiserror::Error;
use trellis_core::Cardinality;
use trellis_driver::DriverError;

/// Errors raised by the graph, session, and element operations.
///
/// Variants fall into four classes, exposed through the `is_*` helpers:
/// user input, transaction state, transport, and consistency. User-input and
/// transaction-state errors surface synchronously without mutating session
/// state; transport errors during commit leave the transaction failed and
/// the caller must roll back.
#[derive(Debug, Error)]
pub enum Error {
    /// A property key collides with the element identifier field.
    #[error("user supplied identifiers are not supported (key {0:?} is the identifier field)")]
    UserSuppliedId(String),

    /// A label was empty or otherwise malformed.
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// The read partition rejected a label mutation or configuration.
    #[error("label rejected by the read partition: {0}")]
    PartitionRejected(String),

    /// An invalid property key or value was supplied.
    #[error("invalid property {key:?}: {reason}")]
    InvalidProperty {
        /// The property key.
        key: String,
        /// Why the property was rejected.
        reason: String,
    },

    /// A single-property accessor was used on a multi-valued key.
    #[error("multiple properties exist for key {0:?}")]
    MultipleProperties(String),

    /// A property key is already bound to a different cardinality.
    #[error("property {key:?} has been defined with {existing} cardinality")]
    CardinalityConflict {
        /// The property key.
        key: String,
        /// The cardinality the key is already bound to.
        existing: Cardinality,
    },

    /// A value could not be canonicalized into an element identifier.
    #[error("invalid identifier value: expected integer, got {0}")]
    InvalidId(String),

    /// Identifier generation is not available for the configured provider.
    #[error("identifier generation is not supported: {0}")]
    IdGeneration(String),

    /// The referenced vertex is not part of this session.
    #[error("vertex {0} is not part of this session")]
    VertexNotFound(i64),

    /// The referenced edge is not part of this session.
    #[error("edge {0} is not part of this session")]
    EdgeNotFound(i64),

    /// A transaction is already open on this session.
    #[error("transaction already open")]
    TransactionAlreadyOpen,

    /// No transaction is open on this session.
    #[error("no open transaction")]
    NoTransaction,

    /// The driver reported a failure.
    #[error("driver error: {0}")]
    Transport(#[from] DriverError),

    /// The working set and the back-end disagree in a way that cannot be
    /// reconciled.
    #[error("consistency violation: {0}")]
    Consistency(String),
}

impl Error {
    /// Build a consistency error from a message.
    #[must_use]
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency(message.into())
    }

    /// Returns `true` for errors caused by invalid caller input.
    #[must_use]
    pub const fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::UserSuppliedId(_)
                | Self::InvalidLabel(_)
                | Self::PartitionRejected(_)
                | Self::InvalidProperty { .. }
                | Self::MultipleProperties(_)
                | Self::CardinalityConflict { .. }
                | Self::InvalidId(_)
                | Self::IdGeneration(_)
                | Self::VertexNotFound(_)
                | Self::EdgeNotFound(_)
        )
    }

    /// Returns `true` for transaction lifecycle errors.
    #[must_use]
    pub const fn is_transaction_state(&self) -> bool {
        matches!(self, Self::TransactionAlreadyOpen | Self::NoTransaction)
    }

    /// Returns `true` for errors raised by the driver.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` for consistency violations.
    #[must_use]
    pub const fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Element identifier providers.
//!
//! A provider allocates identifiers for vertices, edges, and vertex
//! properties, and canonicalizes raw identifier values surfaced by the
//! back-end.
//!
//! - [`SequenceIdProvider`] - reserves identifier ranges from a counter node
//!   maintained on the server
//! - [`NativeIdProvider`] - identifiers assigned by the back-end;
//!   canonicalization only

use trellis_core::Value;

use crate::error::Result;

mod native;
mod sequence;

pub use native::NativeIdProvider;
pub use sequence::{
    SequenceIdProvider, DEFAULT_ID_FIELD, DEFAULT_POOL_SIZE, DEFAULT_SEQUENCE_NODE_LABEL,
};

/// Allocates element identifiers and canonicalizes raw identifier values.
pub trait ElementIdProvider: Send + Sync {
    /// The property name under which element identifiers are stored.
    fn field_name(&self) -> &str;

    /// Allocate a new identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot allocate (transport failure
    /// during a pool refill, or a provider that delegates generation to the
    /// back-end).
    fn generate(&self) -> Result<i64>;

    /// Canonicalize a raw value surfaced by the back-end into an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`](crate::Error::InvalidId) when the value
    /// is not an integer.
    fn canonicalize(&self, raw: &Value) -> Result<i64>;
}

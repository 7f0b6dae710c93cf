//! Identifier provider for back-end-assigned identifiers.

use trellis_core::Value;

use super::{ElementIdProvider, DEFAULT_ID_FIELD};
use crate::error::{Error, Result};

/// A provider for identifiers assigned by the back-end.
///
/// Canonicalization is the identity on integers. Generation is rejected:
/// the statement templates always parameterize the identifier field, so a
/// back-end-assigned identifier cannot exist at insert time. Graphs that
/// create elements need a generating provider such as
/// [`SequenceIdProvider`](super::SequenceIdProvider).
#[derive(Debug, Clone)]
pub struct NativeIdProvider {
    field_name: String,
}

impl NativeIdProvider {
    /// Create a provider storing identifiers under the default field name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_field_name(DEFAULT_ID_FIELD)
    }

    /// Create a provider storing identifiers under the given field name.
    #[must_use]
    pub fn with_field_name(field_name: impl Into<String>) -> Self {
        Self { field_name: field_name.into() }
    }
}

impl Default for NativeIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementIdProvider for NativeIdProvider {
    fn field_name(&self) -> &str {
        &self.field_name
    }

    fn generate(&self) -> Result<i64> {
        Err(Error::IdGeneration(
            "back-end assigned identifiers cannot be generated client-side".to_owned(),
        ))
    }

    fn canonicalize(&self, raw: &Value) -> Result<i64> {
        raw.as_int().ok_or_else(|| Error::InvalidId(raw.type_name().to_owned()))
    }
}

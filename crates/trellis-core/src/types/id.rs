//! Unique identifiers for vertices, edges, and vertex properties.
//!
//! Identifiers are opaque to the session layer; they are allocated by an
//! identifier provider and canonicalized from values surfaced by the
//! back-end. The raw representation is a signed 64-bit integer, which is the
//! integer type the back-end driver exposes.

use serde::{Deserialize, Serialize};

/// Unique identifier for a vertex in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(i64);

impl VertexId {
    /// Create a new `VertexId` from a raw i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw i64 value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for VertexId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for an edge (relationship) in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(i64);

impl EdgeId {
    /// Create a new `EdgeId` from a raw i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw i64 value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for EdgeId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for a vertex property.
///
/// Vertex properties carry identifiers allocated independently from their
/// owning vertex, so multi-valued properties can be addressed individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(i64);

impl PropertyId {
    /// Create a new `PropertyId` from a raw i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw i64 value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for PropertyId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

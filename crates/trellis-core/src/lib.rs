//! Core types for the Trellis property-graph client.
//!
//! This crate defines the identifier, value, and label types shared by the
//! driver abstraction and the session layer. It has no knowledge of the wire
//! protocol or of the transactional working set.

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod types;

pub use types::{
    join_labels, Cardinality, Direction, EdgeId, Label, PropertyId, Value, VertexId,
    LABEL_DELIMITER,
};

//! Trellis - a transactional property-graph client.
//!
//! Trellis layers a transactional, in-memory working set over a remote graph
//! database reachable through a query driver. Mutations stage inside a
//! per-caller [`Session`] and are executed as ordered, parameterized
//! statements at commit; reads blend the working set with streamed back-end
//! results; rollback restores the in-memory state.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use trellis::{Graph, SequenceIdProvider, Cardinality, Direction};
//!
//! let driver: Arc<dyn trellis::Driver> = Arc::new(BoltDriver::connect(uri)?);
//! let provider = Arc::new(SequenceIdProvider::new(Arc::clone(&driver)));
//! let graph = Graph::new(driver, provider.clone(), provider.clone(), provider);
//!
//! // Each caller owns its session
//! let mut session = graph.session()?;
//! let alice = session.add_vertex(&["Person"])?;
//! session.set_vertex_property(alice, Cardinality::Single, "name", "Alice")?;
//! let bob = session.add_vertex(&["Person"])?;
//! let knows = session.add_edge("KNOWS", alice, bob)?;
//! session.set_edge_property(knows, "since", 2020i64)?;
//! session.tx().commit()?;
//!
//! // Traverse
//! let friends = session.vertex_neighbors(alice, Direction::Outgoing, &["KNOWS"])?;
//! session.close()?;
//! ```
//!
//! # Read Partitions
//!
//! A [`partition::ReadPartition`] restricts which server vertices a session
//! may observe and contributes label patterns and predicates to every
//! generated statement. See [`partition`] for the available partitions.
//!
//! # Modules
//!
//! - [`graph`] - Shared configuration and session factory
//! - [`session`] - The transactional working set
//! - [`transaction`] - Explicit transaction control
//! - [`partition`] - Read partitions
//! - [`provider`] - Element identifier providers
//! - [`error`] - Error types

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

mod cypher;
pub mod edge;
pub mod error;
pub mod graph;
pub mod partition;
pub mod provider;
pub mod session;
pub mod transaction;
pub mod vertex;

// Re-export core types
pub use trellis_core::{
    join_labels, Cardinality, Direction, EdgeId, Label, PropertyId, Value, VertexId,
    LABEL_DELIMITER,
};

// Re-export the driver surface consumed by embedders
pub use trellis_driver::{
    Driver, DriverError, DriverSession, DriverTransaction, Node, Record, RecordStream,
    RecordValue, Relationship, Statement,
};

// Public API re-exports
pub use edge::Edge;
pub use error::{Error, Result};
pub use graph::Graph;
pub use partition::{AllLabelsPartition, AnyLabelPartition, ReadPartition, UnrestrictedPartition};
pub use provider::{ElementIdProvider, NativeIdProvider, SequenceIdProvider};
pub use session::{Session, DEFAULT_VERTEX_LABEL};
pub use transaction::Transaction;
pub use vertex::{Vertex, VertexProperty};

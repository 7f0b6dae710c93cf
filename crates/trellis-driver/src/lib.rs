//! Trellis wire-driver abstraction.
//!
//! This crate defines the interfaces the session layer uses to talk to a
//! remote graph database: parameterized statements, record streams, and the
//! driver/session/transaction traits. Concrete network drivers implement
//! these traits; the [`backends`] module ships a scripted in-memory driver
//! used throughout the test suites.
//!
//! # Modules
//!
//! - [`statement`] - Parameterized statement type
//! - [`record`] - Records, nodes, and relationships streamed by the back-end
//! - [`traits`] - Driver, session, and transaction traits
//! - [`backends`] - Concrete driver implementations

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod backends;
mod error;
pub mod record;
pub mod statement;
pub mod traits;

pub use error::{DriverError, DriverResult};
pub use record::{Node, Record, RecordValue, Relationship};
pub use statement::Statement;
pub use traits::{Driver, DriverSession, DriverTransaction, RecordStream};

//! Driver, session, and transaction traits.
//!
//! The session layer owns a [`DriverSession`] and at most one open
//! [`DriverTransaction`] at a time. The traits deal in boxed objects rather
//! than borrowed associated types so both can be stored side by side;
//! implementations share connection state internally.

use crate::error::DriverError;
use crate::record::Record;
use crate::statement::Statement;

/// A connection factory for a remote graph database.
///
/// A `Driver` is shared, immutable configuration: it can be handed to any
/// number of callers, each of which opens its own session.
pub trait Driver: Send + Sync {
    /// Open a new session against the back-end.
    fn session(&self) -> Result<Box<dyn DriverSession>, DriverError>;
}

/// A logical connection to the back-end, owned by a single caller.
pub trait DriverSession: Send {
    /// Begin a new transaction on this session.
    fn begin_transaction(&mut self) -> Result<Box<dyn DriverTransaction>, DriverError>;

    /// Returns `true` if the session has not been closed.
    fn is_open(&self) -> bool;

    /// Close the session and release its resources.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// An open transaction on a driver session.
///
/// The transaction outcome follows the marker protocol: [`success`] or
/// [`failure`] record the intended outcome, and [`close`] applies it:
/// commit if the last marker was success, rollback otherwise.
///
/// [`success`]: DriverTransaction::success
/// [`failure`]: DriverTransaction::failure
/// [`close`]: DriverTransaction::close
pub trait DriverTransaction: Send {
    /// Execute a statement, returning the streamed result.
    fn run(&mut self, statement: &Statement) -> Result<RecordStream, DriverError>;

    /// Mark the transaction for commit on close.
    fn success(&mut self);

    /// Mark the transaction for rollback on close.
    fn failure(&mut self);

    /// Returns `true` if the transaction has not been closed.
    fn is_open(&self) -> bool;

    /// Close the transaction, applying the marked outcome.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// A lazy, finite, single-pass stream of records.
pub struct RecordStream {
    inner: Box<dyn Iterator<Item = Result<Record, DriverError>> + Send>,
}

impl RecordStream {
    /// Wrap an iterator of record results.
    #[must_use]
    pub fn new(inner: impl Iterator<Item = Result<Record, DriverError>> + Send + 'static) -> Self {
        Self { inner: Box::new(inner) }
    }

    /// A stream over already-materialized records.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(records.into_iter().map(Ok))
    }

    /// A stream with no records.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record, DriverError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordStream")
    }
}

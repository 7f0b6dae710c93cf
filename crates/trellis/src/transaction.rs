//! Explicit transaction control for a session.

use crate::error::{Error, Result};
use crate::session::Session;

/// A handle binding a session to the explicit begin/commit/rollback
/// protocol.
///
/// The handle borrows the session; obtain it with
/// [`Session::tx`](crate::Session::tx). Any session I/O implicitly opens a
/// transaction, so `open` is only needed when the caller wants to fail fast
/// on a double open.
///
/// # Example
///
/// ```ignore
/// let mut session = graph.session()?;
/// session.tx().open()?;
/// let vertex = session.add_vertex(&["Person"])?;
/// session.tx().commit()?;
/// ```
pub struct Transaction<'a> {
    session: &'a mut Session,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransactionAlreadyOpen`] if one is already open.
    pub fn open(&mut self) -> Result<()> {
        self.session.begin()
    }

    /// Returns `true` if a transaction is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_transaction_open()
    }

    /// Open a transaction if none is open.
    pub fn read_write(&mut self) -> Result<()> {
        self.session.read_write()
    }

    /// Commit the open transaction: flush staged mutations as ordered
    /// statements, confirm with the back-end, and finalize the in-memory
    /// elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTransaction`] when no transaction is open. A
    /// transport error leaves the transaction failed; the caller must
    /// [`rollback`](Self::rollback) before using the session again.
    pub fn commit(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NoTransaction);
        }
        self.session.commit()
    }

    /// Roll back the open (or failed) transaction and restore the in-memory
    /// working set to its last committed state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTransaction`] when there is nothing to roll back.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.session.has_transaction() {
            return Err(Error::NoTransaction);
        }
        self.session.rollback()
    }

    /// Close the transaction without confirming it; the back-end treats an
    /// unconfirmed transaction as rolled back.
    pub fn close(&mut self) {
        self.session.close_transaction();
    }
}

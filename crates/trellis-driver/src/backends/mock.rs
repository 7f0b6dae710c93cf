//! A scripted in-memory driver for tests.
//!
//! [`MockDriver`] records every statement it is asked to run and answers
//! from a queue of scripted responses. A response is keyed by a fragment of
//! statement text; the first queued response whose fragment matches is
//! consumed and returned. Statements with no matching response yield an
//! empty stream, which is what mutation statements produce in practice.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::DriverError;
use crate::record::Record;
use crate::statement::Statement;
use crate::traits::{Driver, DriverSession, DriverTransaction, RecordStream};

struct ScriptedResponse {
    fragment: String,
    result: Result<Vec<Record>, DriverError>,
}

#[derive(Default)]
struct MockState {
    statements: Vec<Statement>,
    responses: Vec<ScriptedResponse>,
    commits: usize,
    rollbacks: usize,
}

impl MockState {
    fn take_response(&mut self, text: &str) -> Option<Result<Vec<Record>, DriverError>> {
        let index = self.responses.iter().position(|r| text.contains(&r.fragment))?;
        Some(self.responses.remove(index).result)
    }
}

/// A scripted driver that serves queued responses and records statements.
///
/// # Example
///
/// ```
/// use trellis_driver::backends::MockDriver;
/// use trellis_driver::{Driver, Record, RecordValue};
/// use trellis_core::Value;
///
/// let driver = MockDriver::new();
/// driver.respond("RETURN g.nextId", vec![Record::new(vec![RecordValue::Scalar(Value::Int(1000))])]);
///
/// let mut session = driver.session().expect("session");
/// let _tx = session.begin_transaction().expect("transaction");
/// assert!(driver.statement_texts().is_empty());
/// ```
#[derive(Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create a driver with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(MockState::default())) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue records to be returned for the next statement whose text
    /// contains `fragment`.
    pub fn respond(&self, fragment: impl Into<String>, records: Vec<Record>) {
        self.lock()
            .responses
            .push(ScriptedResponse { fragment: fragment.into(), result: Ok(records) });
    }

    /// Queue a failure for the next statement whose text contains `fragment`.
    pub fn fail(&self, fragment: impl Into<String>, error: DriverError) {
        self.lock()
            .responses
            .push(ScriptedResponse { fragment: fragment.into(), result: Err(error) });
    }

    /// All statements run so far, in execution order.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    /// The text of all statements run so far, in execution order.
    #[must_use]
    pub fn statement_texts(&self) -> Vec<String> {
        self.lock().statements.iter().map(|s| s.text().to_owned()).collect()
    }

    /// How many transactions have been committed.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    /// How many transactions have been rolled back.
    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    /// Number of scripted responses that have not been consumed.
    #[must_use]
    pub fn pending_responses(&self) -> usize {
        self.lock().responses.len()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MockDriver {
    fn session(&self) -> Result<Box<dyn DriverSession>, DriverError> {
        Ok(Box::new(MockSession { state: Arc::clone(&self.state), open: true }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

impl DriverSession for MockSession {
    fn begin_transaction(&mut self) -> Result<Box<dyn DriverTransaction>, DriverError> {
        if !self.open {
            return Err(DriverError::SessionClosed);
        }
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
            open: true,
            success_marked: false,
        }))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.open = false;
        Ok(())
    }
}

struct MockTransaction {
    state: Arc<Mutex<MockState>>,
    open: bool,
    success_marked: bool,
}

impl DriverTransaction for MockTransaction {
    fn run(&mut self, statement: &Statement) -> Result<RecordStream, DriverError> {
        if !self.open {
            return Err(DriverError::TransactionClosed);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.statements.push(statement.clone());
        match state.take_response(statement.text()) {
            Some(Ok(records)) => Ok(RecordStream::from_records(records)),
            Some(Err(error)) => Err(error),
            None => Ok(RecordStream::empty()),
        }
    }

    fn success(&mut self) {
        self.success_marked = true;
    }

    fn failure(&mut self) {
        self.success_marked = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.open {
            self.open = false;
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if self.success_marked {
                state.commits += 1;
            } else {
                state.rollbacks += 1;
            }
        }
        Ok(())
    }
}

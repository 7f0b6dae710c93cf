//! Pooled identifier provider backed by a server-side counter node.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use trellis_core::Value;
use trellis_driver::{Driver, RecordValue, Statement};

use super::ElementIdProvider;
use crate::error::{Error, Result};

/// Default property name under which identifiers are stored.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default label of the counter node maintained on the server.
pub const DEFAULT_SEQUENCE_NODE_LABEL: &str = "UniqueIdentifierGenerator";

/// Default number of identifiers reserved per refill.
pub const DEFAULT_POOL_SIZE: i64 = 1000;

/// An identifier provider that reserves ranges from a counter node on the
/// server.
///
/// The fast path is a single atomic increment against the local pool. When
/// the pool is exhausted, one caller at a time refills it by atomically
/// bumping the counter node by the pool size in its own transaction;
/// concurrent callers contend only on that refill.
///
/// Any transport failure during a refill aborts the requesting operation
/// and leaves no identifiers from the aborted refill observable.
pub struct SequenceIdProvider {
    driver: Arc<dyn Driver>,
    field_name: String,
    sequence_node_label: String,
    pool_size: i64,
    counter: AtomicI64,
    maximum: AtomicI64,
    refill: Mutex<()>,
}

impl SequenceIdProvider {
    /// Create a provider with the default pool size, field name, and
    /// sequence node label.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_config(driver, DEFAULT_POOL_SIZE, DEFAULT_ID_FIELD, DEFAULT_SEQUENCE_NODE_LABEL)
    }

    /// Create a provider with an explicit pool size, identifier field name,
    /// and sequence node label.
    #[must_use]
    pub fn with_config(
        driver: Arc<dyn Driver>,
        pool_size: i64,
        field_name: impl Into<String>,
        sequence_node_label: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            field_name: field_name.into(),
            sequence_node_label: sequence_node_label.into(),
            pool_size,
            counter: AtomicI64::new(0),
            maximum: AtomicI64::new(0),
            refill: Mutex::new(()),
        }
    }

    /// The configured pool size.
    #[must_use]
    pub const fn pool_size(&self) -> i64 {
        self.pool_size
    }

    /// Reserve a fresh identifier range from the server.
    ///
    /// Sets the local counter before the maximum so a concurrent fast-path
    /// reader never sees a maximum covering identifiers that were not
    /// reserved.
    fn refill_pool(&self) -> Result<()> {
        let mut session = self.driver.session()?;
        let mut transaction = session.begin_transaction()?;
        let statement = Statement::new(format!(
            "MERGE (g:`{}`) ON CREATE SET g.nextId = 1 ON MATCH SET g.nextId = g.nextId + $poolSize RETURN g.nextId",
            self.sequence_node_label
        ))
        .with_parameter("poolSize", self.pool_size);
        let mut stream = transaction.run(&statement)?;
        let record = stream
            .next()
            .ok_or_else(|| Error::consistency("sequence allocator returned no rows"))??;
        let next_id = record
            .get(0)
            .and_then(RecordValue::as_int)
            .ok_or_else(|| Error::consistency("sequence allocator returned a non-integer"))?;
        transaction.success();
        transaction.close()?;
        session.close()?;
        self.counter.store(next_id - self.pool_size, Ordering::SeqCst);
        self.maximum.store(next_id, Ordering::SeqCst);
        debug!(next_id, pool_size = self.pool_size, "reserved identifier pool");
        Ok(())
    }
}

impl ElementIdProvider for SequenceIdProvider {
    fn field_name(&self) -> &str {
        &self.field_name
    }

    fn generate(&self) -> Result<i64> {
        let mut maximum = self.maximum.load(Ordering::SeqCst);
        let mut identifier = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        if identifier <= maximum {
            return Ok(identifier);
        }
        loop {
            let _guard = self.refill.lock().unwrap_or_else(PoisonError::into_inner);
            // re-check under the lock: another caller may have refilled while
            // this one was waiting
            maximum = self.maximum.load(Ordering::SeqCst);
            identifier = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            if identifier >= maximum {
                self.refill_pool()?;
                maximum = self.maximum.load(Ordering::SeqCst);
                identifier = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            }
            if identifier <= maximum {
                return Ok(identifier);
            }
        }
    }

    fn canonicalize(&self, raw: &Value) -> Result<i64> {
        raw.as_int().ok_or_else(|| Error::InvalidId(raw.type_name().to_owned()))
    }
}

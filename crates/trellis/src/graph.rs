//! The graph facade: shared configuration and per-caller session factory.

use std::collections::BTreeSet;
use std::sync::Arc;

use trellis_core::Label;
use trellis_driver::Driver;

use crate::error::{Error, Result};
use crate::partition::{ReadPartition, UnrestrictedPartition};
use crate::provider::ElementIdProvider;
use crate::session::Session;

/// Shared, immutable graph configuration.
///
/// A `Graph` holds the driver, the read partition, and the identifier
/// providers. It is cheap to share across callers; each caller obtains its
/// own [`Session`] through [`session`](Self::session) and owns that
/// session's lifetime. The graph itself never performs I/O.
///
/// # Example
///
/// ```ignore
/// let driver: Arc<dyn Driver> = Arc::new(BoltDriver::connect(uri)?);
/// let provider = Arc::new(SequenceIdProvider::new(Arc::clone(&driver)));
/// let graph = Graph::new(driver, provider.clone(), provider.clone(), provider);
///
/// let mut session = graph.session()?;
/// let vertex = session.add_vertex(&["Person"])?;
/// session.tx().commit()?;
/// session.close()?;
/// ```
pub struct Graph {
    driver: Arc<dyn Driver>,
    partition: Arc<dyn ReadPartition>,
    vertex_id_provider: Arc<dyn ElementIdProvider>,
    edge_id_provider: Arc<dyn ElementIdProvider>,
    property_id_provider: Arc<dyn ElementIdProvider>,
    vertex_labels: BTreeSet<Label>,
}

impl Graph {
    /// Create a graph with an unrestricted read partition.
    #[must_use]
    pub fn new(
        driver: Arc<dyn Driver>,
        vertex_id_provider: Arc<dyn ElementIdProvider>,
        edge_id_provider: Arc<dyn ElementIdProvider>,
        property_id_provider: Arc<dyn ElementIdProvider>,
    ) -> Self {
        Self {
            driver,
            partition: Arc::new(UnrestrictedPartition::new()),
            vertex_id_provider,
            edge_id_provider,
            property_id_provider,
            vertex_labels: BTreeSet::new(),
        }
    }

    /// Create a graph restricted to a read partition.
    ///
    /// `vertex_labels` declares the label set the graph's callers put on the
    /// vertices they create; it is validated against the partition so a
    /// misconfigured graph fails at construction instead of silently
    /// creating invisible vertices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartitionRejected`] when a vertex carrying the given
    /// labels would fall outside the partition.
    pub fn with_partition(
        driver: Arc<dyn Driver>,
        partition: Arc<dyn ReadPartition>,
        vertex_labels: &[&str],
        vertex_id_provider: Arc<dyn ElementIdProvider>,
        edge_id_provider: Arc<dyn ElementIdProvider>,
        property_id_provider: Arc<dyn ElementIdProvider>,
    ) -> Result<Self> {
        let labels: BTreeSet<Label> =
            vertex_labels.iter().map(|label| Label::new(*label)).collect();
        if !partition.contains_vertex(&labels) {
            return Err(Error::PartitionRejected(
                "vertices created by the graph would not be part of the partition".to_owned(),
            ));
        }
        Ok(Self {
            driver,
            partition,
            vertex_id_provider,
            edge_id_provider,
            property_id_provider,
            vertex_labels: labels,
        })
    }

    /// Open a new session against the back-end.
    ///
    /// The caller owns the session: it must be closed (or dropped) when the
    /// work is done, and it must not be shared across callers.
    pub fn session(&self) -> Result<Session> {
        let driver_session = self.driver.session()?;
        Ok(Session::new(
            driver_session,
            Arc::clone(&self.partition),
            Arc::clone(&self.vertex_id_provider),
            Arc::clone(&self.edge_id_provider),
            Arc::clone(&self.property_id_provider),
        ))
    }

    /// The read partition applied to this graph.
    #[must_use]
    pub fn partition(&self) -> &Arc<dyn ReadPartition> {
        &self.partition
    }

    /// Labels appended to vertices created through this graph.
    #[must_use]
    pub const fn vertex_labels(&self) -> &BTreeSet<Label> {
        &self.vertex_labels
    }
}

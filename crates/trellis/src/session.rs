//! The transactional working set.
//!
//! A `Session` owns every vertex and edge materialized or created during its
//! lifetime. Elements live in registries keyed by id; adjacency and endpoint
//! references are id handles resolved through those registries. Mutations
//! stage in the session's queues and are flushed as ordered statements at
//! commit; rollback restores the element snapshots.
//!
//! A session serves a single caller. Callers that need concurrency open
//! independent sessions through the [`Graph`](crate::Graph) facade.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error};
use trellis_core::{Cardinality, Direction, EdgeId, Label, PropertyId, Value, VertexId};
use trellis_driver::{DriverSession, DriverTransaction, Record, RecordStream, RecordValue, Statement};

use crate::edge::Edge;
use crate::error::{Error, Result};
use crate::partition::ReadPartition;
use crate::provider::ElementIdProvider;
use crate::transaction::Transaction;
use crate::vertex::{Vertex, VertexProperty};

/// Label assigned to vertices created without any label.
pub const DEFAULT_VERTEX_LABEL: &str = "vertex";

/// A persisted edge parked in the delete queue.
///
/// Implicit deletions (an endpoint vertex was removed) emit no DELETE
/// statement of their own; the vertex's DETACH DELETE covers them. Both
/// kinds are restored on rollback.
struct DeletedEdge {
    edge: Edge,
    explicit: bool,
}

/// The per-caller transactional working set.
pub struct Session {
    partition: Arc<dyn ReadPartition>,
    vertex_id_provider: Arc<dyn ElementIdProvider>,
    edge_id_provider: Arc<dyn ElementIdProvider>,
    property_id_provider: Arc<dyn ElementIdProvider>,
    vertex_id_field: String,
    edge_id_field: String,
    driver_session: Box<dyn DriverSession>,
    transaction: Option<Box<dyn DriverTransaction>>,
    vertices: HashMap<VertexId, Vertex>,
    edges: HashMap<EdgeId, Edge>,
    deleted_vertices: HashSet<VertexId>,
    deleted_edges: HashSet<EdgeId>,
    transient_vertices: Vec<VertexId>,
    transient_edges: Vec<EdgeId>,
    vertex_update_queue: BTreeSet<VertexId>,
    edge_update_queue: BTreeSet<EdgeId>,
    vertex_delete_queue: BTreeMap<VertexId, Vertex>,
    edge_delete_queue: BTreeMap<EdgeId, DeletedEdge>,
    vertices_loaded: bool,
    edges_loaded: bool,
}

impl Session {
    pub(crate) fn new(
        driver_session: Box<dyn DriverSession>,
        partition: Arc<dyn ReadPartition>,
        vertex_id_provider: Arc<dyn ElementIdProvider>,
        edge_id_provider: Arc<dyn ElementIdProvider>,
        property_id_provider: Arc<dyn ElementIdProvider>,
    ) -> Self {
        let vertex_id_field = vertex_id_provider.field_name().to_owned();
        let edge_id_field = edge_id_provider.field_name().to_owned();
        Self {
            partition,
            vertex_id_provider,
            edge_id_provider,
            property_id_provider,
            vertex_id_field,
            edge_id_field,
            driver_session,
            transaction: None,
            vertices: HashMap::new(),
            edges: HashMap::new(),
            deleted_vertices: HashSet::new(),
            deleted_edges: HashSet::new(),
            transient_vertices: Vec::new(),
            transient_edges: Vec::new(),
            vertex_update_queue: BTreeSet::new(),
            edge_update_queue: BTreeSet::new(),
            vertex_delete_queue: BTreeMap::new(),
            edge_delete_queue: BTreeMap::new(),
            vertices_loaded: false,
            edges_loaded: false,
        }
    }

    // ========================================================================
    // Transaction lifecycle
    // ========================================================================

    /// The explicit transaction handle for this session.
    pub fn tx(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Returns `true` if a transaction is open on this session.
    #[must_use]
    pub fn is_transaction_open(&self) -> bool {
        self.transaction.as_ref().is_some_and(|tx| tx.is_open())
    }

    pub(crate) fn has_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.is_transaction_open() {
            return Err(Error::TransactionAlreadyOpen);
        }
        let transaction = self.driver_session.begin_transaction()?;
        debug!("beginning transaction");
        self.transaction = Some(transaction);
        Ok(())
    }

    /// Open a transaction if none is open. Every I/O point goes through
    /// this.
    pub(crate) fn read_write(&mut self) -> Result<()> {
        if !self.is_transaction_open() {
            self.begin()?;
        }
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> Result<()> {
        if self.transaction.is_none() {
            return Err(Error::NoTransaction);
        }
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.success();
        }
        if let Err(e) = self.flush() {
            error!(error = %e, "error committing transaction");
            return Err(e);
        }
        if let Some(mut transaction) = self.transaction.take() {
            if let Err(e) = transaction.close() {
                // the server rejected the commit; keep the handle so the
                // caller can roll back
                self.transaction = Some(transaction);
                error!(error = %e, "error committing transaction");
                return Err(e.into());
            }
        }
        for id in &self.transient_vertices {
            if let Some(vertex) = self.vertices.get_mut(id) {
                vertex.finalize_commit();
            }
        }
        for id in &self.transient_edges {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.finalize_commit();
            }
        }
        for id in &self.vertex_update_queue {
            if let Some(vertex) = self.vertices.get_mut(id) {
                vertex.finalize_commit();
            }
        }
        for id in &self.edge_update_queue {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.finalize_commit();
            }
        }
        self.clear_queues();
        debug!("transaction committed");
        Ok(())
    }

    pub(crate) fn rollback(&mut self) -> Result<()> {
        if self.transaction.is_none() {
            return Err(Error::NoTransaction);
        }
        if let Some(mut transaction) = self.transaction.take() {
            transaction.failure();
            if let Err(e) = transaction.close() {
                debug!(error = %e, "error closing rolled-back transaction");
            }
        }
        // a rolled-back update or delete means the registry no longer
        // reflects everything the server holds
        if !self.vertex_update_queue.is_empty() || !self.deleted_vertices.is_empty() {
            self.vertices_loaded = false;
        }
        if !self.edge_update_queue.is_empty() || !self.deleted_edges.is_empty() {
            self.edges_loaded = false;
        }
        for id in std::mem::take(&mut self.transient_edges) {
            if let Some(edge) = self.edges.remove(&id) {
                self.detach_edge(&edge, id);
            }
        }
        for id in std::mem::take(&mut self.transient_vertices) {
            self.vertices.remove(&id);
        }
        for id in std::mem::take(&mut self.vertex_update_queue) {
            if let Some(vertex) = self.vertices.get_mut(&id) {
                vertex.rollback();
            }
        }
        for id in std::mem::take(&mut self.edge_update_queue) {
            if let Some(edge) = self.edges.get_mut(&id) {
                edge.rollback();
            }
        }
        for (id, mut vertex) in std::mem::take(&mut self.vertex_delete_queue) {
            vertex.rollback();
            self.vertices.insert(id, vertex);
        }
        for (id, entry) in std::mem::take(&mut self.edge_delete_queue) {
            let mut edge = entry.edge;
            edge.rollback();
            let (source, target) = (edge.source(), edge.target());
            self.edges.insert(id, edge);
            if let Some(vertex) = self.vertices.get_mut(&source) {
                vertex.add_out_edge(id);
            }
            if let Some(vertex) = self.vertices.get_mut(&target) {
                vertex.add_in_edge(id);
            }
        }
        self.deleted_vertices.clear();
        self.deleted_edges.clear();
        debug!("transaction rolled back");
        Ok(())
    }

    /// Close the driver transaction without committing; the server treats an
    /// unconfirmed transaction as rolled back.
    pub(crate) fn close_transaction(&mut self) {
        if let Some(mut transaction) = self.transaction.take() {
            if let Err(e) = transaction.close() {
                debug!(error = %e, "error closing transaction");
            }
        }
    }

    /// Close the session, rolling back any outstanding transaction.
    pub fn close(&mut self) -> Result<()> {
        self.close_transaction();
        debug!("closing session");
        self.driver_session.close()?;
        Ok(())
    }

    fn clear_queues(&mut self) {
        self.deleted_edges.clear();
        self.edge_delete_queue.clear();
        self.deleted_vertices.clear();
        self.vertex_delete_queue.clear();
        self.transient_edges.clear();
        self.transient_vertices.clear();
        self.vertex_update_queue.clear();
        self.edge_update_queue.clear();
    }

    // ========================================================================
    // Element creation and mutation
    // ========================================================================

    /// Create a transient vertex with the given labels.
    ///
    /// A vertex created without labels gets [`DEFAULT_VERTEX_LABEL`].
    pub fn add_vertex(&mut self, labels: &[&str]) -> Result<VertexId> {
        self.read_write()?;
        let mut label_set = BTreeSet::new();
        for label in labels {
            if label.is_empty() {
                return Err(Error::InvalidLabel("label cannot be empty".to_owned()));
            }
            label_set.insert(Label::new(*label));
        }
        if label_set.is_empty() {
            label_set.insert(Label::new(DEFAULT_VERTEX_LABEL));
        }
        let id = VertexId::new(self.vertex_id_provider.generate()?);
        if self.vertices.contains_key(&id) {
            return Err(Error::consistency(format!("vertex identifier collision: {}", id.as_i64())));
        }
        let vertex = Vertex::new(id, self.vertex_id_field.clone(), label_set);
        // register as transient before anything can mark it dirty, so a
        // transient vertex never lands in the update queue
        self.transient_vertices.push(id);
        self.vertices.insert(id, vertex);
        Ok(id)
    }

    /// Create a transient edge between two session vertices.
    pub fn add_edge(&mut self, label: &str, source: VertexId, target: VertexId) -> Result<EdgeId> {
        self.read_write()?;
        if label.is_empty() {
            return Err(Error::InvalidLabel("label cannot be empty".to_owned()));
        }
        if !self.vertices.contains_key(&source) {
            return Err(Error::VertexNotFound(source.as_i64()));
        }
        if !self.vertices.contains_key(&target) {
            return Err(Error::VertexNotFound(target.as_i64()));
        }
        let id = EdgeId::new(self.edge_id_provider.generate()?);
        if self.edges.contains_key(&id) {
            return Err(Error::consistency(format!("edge identifier collision: {}", id.as_i64())));
        }
        let edge = Edge::new(id, self.edge_id_field.clone(), Label::new(label), source, target);
        self.transient_edges.push(id);
        self.edges.insert(id, edge);
        if let Some(vertex) = self.vertices.get_mut(&source) {
            vertex.add_out_edge(id);
        }
        if let Some(vertex) = self.vertices.get_mut(&target) {
            vertex.add_in_edge(id);
        }
        Ok(id)
    }

    /// Look up a vertex in the working set.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Look up an edge in the working set.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Add a label to a vertex.
    pub fn add_vertex_label(&mut self, vertex: VertexId, label: &str) -> Result<()> {
        if label.is_empty() {
            return Err(Error::InvalidLabel("label cannot be empty".to_owned()));
        }
        let label = Label::new(label);
        if !self.partition.validate_label(&label) {
            return Err(Error::PartitionRejected(label.to_string()));
        }
        let entry =
            self.vertices.get_mut(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
        if entry.add_label(label) {
            self.mark_vertex_dirty(vertex);
        }
        Ok(())
    }

    /// Remove a label from a vertex.
    pub fn remove_vertex_label(&mut self, vertex: VertexId, label: &str) -> Result<()> {
        let label = Label::new(label);
        if !self.partition.validate_label(&label) {
            return Err(Error::PartitionRejected(label.to_string()));
        }
        let entry =
            self.vertices.get_mut(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
        if entry.remove_label(&label) {
            self.mark_vertex_dirty(vertex);
        }
        Ok(())
    }

    /// Store a vertex property value under the given cardinality.
    ///
    /// Returns the identifier allocated for the new property value.
    pub fn set_vertex_property(
        &mut self,
        vertex: VertexId,
        cardinality: Cardinality,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<PropertyId> {
        let value = value.into();
        self.validate_property(key, &value, &self.vertex_id_field)?;
        if !self.vertices.contains_key(&vertex) {
            return Err(Error::VertexNotFound(vertex.as_i64()));
        }
        let id = PropertyId::new(self.property_id_provider.generate()?);
        let property = VertexProperty::new(id, key, value);
        let entry =
            self.vertices.get_mut(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
        if entry.set_property(cardinality, property)? {
            self.mark_vertex_dirty(vertex);
        }
        Ok(id)
    }

    /// The sole property value for a key on a vertex.
    pub fn vertex_property(&self, vertex: VertexId, key: &str) -> Result<Option<&VertexProperty>> {
        self.vertices
            .get(&vertex)
            .ok_or(Error::VertexNotFound(vertex.as_i64()))?
            .property(key)
    }

    /// All property values on a vertex for the given keys (all keys when
    /// empty).
    pub fn vertex_properties(&self, vertex: VertexId, keys: &[&str]) -> Result<Vec<&VertexProperty>> {
        Ok(self
            .vertices
            .get(&vertex)
            .ok_or(Error::VertexNotFound(vertex.as_i64()))?
            .properties(keys))
    }

    /// Remove a single vertex property value by identifier.
    pub fn remove_vertex_property(
        &mut self,
        vertex: VertexId,
        property: PropertyId,
    ) -> Result<bool> {
        let entry =
            self.vertices.get_mut(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
        let removed = entry.remove_property(property);
        if removed {
            self.mark_vertex_dirty(vertex);
        }
        Ok(removed)
    }

    /// Set an edge property, replacing any previous value.
    pub fn set_edge_property(
        &mut self,
        edge: EdgeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let value = value.into();
        self.validate_property(key, &value, &self.edge_id_field)?;
        let entry = self.edges.get_mut(&edge).ok_or(Error::EdgeNotFound(edge.as_i64()))?;
        entry.set_property(key, value);
        self.mark_edge_dirty(edge);
        Ok(())
    }

    /// Look up an edge property value.
    pub fn edge_property(&self, edge: EdgeId, key: &str) -> Result<Option<&Value>> {
        Ok(self.edges.get(&edge).ok_or(Error::EdgeNotFound(edge.as_i64()))?.property(key))
    }

    /// Remove an edge property value.
    pub fn remove_edge_property(&mut self, edge: EdgeId, key: &str) -> Result<bool> {
        let entry = self.edges.get_mut(&edge).ok_or(Error::EdgeNotFound(edge.as_i64()))?;
        let removed = entry.remove_property(key);
        if removed {
            self.mark_edge_dirty(edge);
        }
        Ok(removed)
    }

    fn validate_property(&self, key: &str, value: &Value, id_field: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidProperty {
                key: key.to_owned(),
                reason: "key cannot be empty".to_owned(),
            });
        }
        if key == id_field {
            return Err(Error::UserSuppliedId(key.to_owned()));
        }
        match value {
            Value::Null => Err(Error::InvalidProperty {
                key: key.to_owned(),
                reason: "value cannot be null".to_owned(),
            }),
            Value::Map(_) => Err(Error::InvalidProperty {
                key: key.to_owned(),
                reason: "map-typed properties are not supported".to_owned(),
            }),
            _ => Ok(()),
        }
    }

    fn mark_vertex_dirty(&mut self, vertex: VertexId) {
        // transient vertices are flushed by their insert statement
        if !self.transient_vertices.contains(&vertex) {
            self.vertex_update_queue.insert(vertex);
        }
    }

    fn mark_edge_dirty(&mut self, edge: EdgeId) {
        if !self.transient_edges.contains(&edge) {
            self.edge_update_queue.insert(edge);
        }
    }

    // ========================================================================
    // Element removal
    // ========================================================================

    /// Remove a vertex and all its incident edges.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<()> {
        self.read_write()?;
        let incident: Vec<EdgeId> = {
            let vertex = self.vertices.get(&id).ok_or(Error::VertexNotFound(id.as_i64()))?;
            vertex.out_edges().iter().chain(vertex.in_edges().iter()).copied().collect()
        };
        for edge in incident {
            self.remove_edge_internal(edge, false);
        }
        if let Some(position) = self.transient_vertices.iter().position(|v| *v == id) {
            debug!(vertex = id.as_i64(), "discarding transient vertex");
            self.transient_vertices.remove(position);
            self.vertices.remove(&id);
        } else {
            debug!(vertex = id.as_i64(), "deleting vertex");
            self.deleted_vertices.insert(id);
            self.vertex_update_queue.remove(&id);
            if let Some(vertex) = self.vertices.remove(&id) {
                self.vertex_delete_queue.insert(id, vertex);
            }
        }
        Ok(())
    }

    /// Remove an edge, detaching it from both endpoints.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        self.read_write()?;
        if !self.edges.contains_key(&id) {
            return Err(Error::EdgeNotFound(id.as_i64()));
        }
        self.remove_edge_internal(id, true);
        Ok(())
    }

    fn remove_edge_internal(&mut self, id: EdgeId, explicit: bool) {
        if let Some(edge) = self.edges.get(&id) {
            let (source, target) = (edge.source(), edge.target());
            if let Some(vertex) = self.vertices.get_mut(&source) {
                vertex.remove_edge(id);
            }
            if let Some(vertex) = self.vertices.get_mut(&target) {
                vertex.remove_edge(id);
            }
        }
        if let Some(position) = self.transient_edges.iter().position(|e| *e == id) {
            debug!(edge = id.as_i64(), "discarding transient edge");
            self.transient_edges.remove(position);
            self.edges.remove(&id);
        } else {
            debug!(edge = id.as_i64(), "deleting edge");
            self.deleted_edges.insert(id);
            // no MERGE for an element that is being deleted
            self.edge_update_queue.remove(&id);
            if let Some(edge) = self.edges.remove(&id) {
                self.edge_delete_queue.insert(id, DeletedEdge { edge, explicit });
            }
        }
    }

    fn detach_edge(&mut self, edge: &Edge, id: EdgeId) {
        if let Some(vertex) = self.vertices.get_mut(&edge.source()) {
            vertex.remove_edge(id);
        }
        if let Some(vertex) = self.vertices.get_mut(&edge.target()) {
            vertex.remove_edge(id);
        }
    }

    // ========================================================================
    // Reads and traversal
    // ========================================================================

    fn vertex_match_pattern(&self, alias: &str) -> String {
        let labels = self.partition.match_pattern_labels();
        format!("({alias}{})", crate::cypher::label_prefix(&labels))
    }

    /// Fetch vertices by id, or every visible vertex when `ids` is empty.
    ///
    /// Resident elements answer from memory; the rest stream from the
    /// back-end. An unfiltered fetch latches the loaded flag, after which
    /// reads are answered entirely from the registry.
    pub fn vertices(&mut self, ids: &[VertexId]) -> Result<Vec<VertexId>> {
        self.read_write()?;
        if !self.vertices_loaded {
            if !ids.is_empty() {
                let identifiers: BTreeSet<VertexId> = ids.iter().copied().collect();
                let resident: Vec<VertexId> = identifiers
                    .iter()
                    .filter(|id| self.vertices.contains_key(id))
                    .copied()
                    .collect();
                let remote: Vec<Value> = identifiers
                    .iter()
                    .filter(|id| !self.vertices.contains_key(id))
                    .map(|id| Value::Int(id.as_i64()))
                    .collect();
                let mut result = resident;
                if !remote.is_empty() {
                    let predicate = self.partition.match_predicate("n");
                    let text = format!(
                        "MATCH {} WHERE n.{} IN $ids{} RETURN n",
                        self.vertex_match_pattern("n"),
                        self.vertex_id_field,
                        predicate.map(|p| format!(" AND {p}")).unwrap_or_default()
                    );
                    let statement = Statement::new(text).with_parameter("ids", Value::List(remote));
                    result.extend(self.vertex_query(&statement)?);
                }
                return Ok(result);
            }
            let predicate = self.partition.match_predicate("n");
            let text = format!(
                "MATCH {}{} RETURN n",
                self.vertex_match_pattern("n"),
                predicate.map(|p| format!(" WHERE {p}")).unwrap_or_default()
            );
            let mut result = self.transient_vertices.clone();
            result.extend(self.vertex_query(&Statement::new(text))?);
            // every persisted vertex has been surfaced in this transaction
            self.vertices_loaded = true;
            return Ok(result);
        }
        if !ids.is_empty() {
            let identifiers: BTreeSet<VertexId> = ids.iter().copied().collect();
            return Ok(identifiers
                .iter()
                .filter(|id| self.vertices.contains_key(id))
                .copied()
                .collect());
        }
        let mut result: Vec<VertexId> = self.vertices.keys().copied().collect();
        result.sort_unstable();
        Ok(result)
    }

    /// Fetch edges by id, or every visible edge when `ids` is empty.
    pub fn edges(&mut self, ids: &[EdgeId]) -> Result<Vec<EdgeId>> {
        self.read_write()?;
        if !self.edges_loaded {
            if !ids.is_empty() {
                let identifiers: BTreeSet<EdgeId> = ids.iter().copied().collect();
                let resident: Vec<EdgeId> =
                    identifiers.iter().filter(|id| self.edges.contains_key(id)).copied().collect();
                let remote: Vec<Value> = identifiers
                    .iter()
                    .filter(|id| !self.edges.contains_key(id))
                    .map(|id| Value::Int(id.as_i64()))
                    .collect();
                let mut result = resident;
                if !remote.is_empty() {
                    let text = format!(
                        "MATCH {}-[r]->{} WHERE r.{} IN $ids{} RETURN n, r, m",
                        self.vertex_match_pattern("n"),
                        self.vertex_match_pattern("m"),
                        self.edge_id_field,
                        self.endpoint_predicates(" AND ")
                    );
                    let statement = Statement::new(text).with_parameter("ids", Value::List(remote));
                    result.extend(self.edge_query(&statement)?);
                }
                return Ok(result);
            }
            let text = format!(
                "MATCH {}-[r]->{}{} RETURN n, r, m",
                self.vertex_match_pattern("n"),
                self.vertex_match_pattern("m"),
                self.endpoint_predicates(" WHERE ")
            );
            let mut result = self.transient_edges.clone();
            result.extend(self.edge_query(&Statement::new(text))?);
            self.edges_loaded = true;
            return Ok(result);
        }
        if !ids.is_empty() {
            let identifiers: BTreeSet<EdgeId> = ids.iter().copied().collect();
            return Ok(identifiers.iter().filter(|id| self.edges.contains_key(id)).copied().collect());
        }
        let mut result: Vec<EdgeId> = self.edges.keys().copied().collect();
        result.sort_unstable();
        Ok(result)
    }

    fn endpoint_predicates(&self, prefix: &str) -> String {
        match (self.partition.match_predicate("n"), self.partition.match_predicate("m")) {
            (Some(out_predicate), Some(in_predicate)) => {
                format!("{prefix}{out_predicate} AND {in_predicate}")
            }
            _ => String::new(),
        }
    }

    /// Incident edges of a vertex, optionally filtered by label.
    ///
    /// In-memory edges are snapshotted first; the back-end contributes only
    /// edges the session does not already hold (`WHERE NOT r.<id> IN $ids`).
    /// The per-direction loaded flag latches only on unfiltered calls,
    /// because a filtered fetch caches a partial set.
    pub fn vertex_edges(
        &mut self,
        vertex: VertexId,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Vec<EdgeId>> {
        self.read_write()?;
        let (out_snapshot, in_snapshot, loaded, pattern) = self.incident_snapshot(vertex, direction)?;
        let mut memory: Vec<EdgeId> = Vec::new();
        memory.extend(out_snapshot.iter().copied().filter(|id| self.edge_has_label(*id, labels)));
        memory.extend(in_snapshot.iter().copied().filter(|id| self.edge_has_label(*id, labels)));
        if loaded {
            return Ok(memory);
        }
        let known: Vec<EdgeId> = out_snapshot.iter().chain(in_snapshot.iter()).copied().collect();
        let statement =
            self.incident_statement(&pattern, vertex, direction, labels, &known, "n, r, m");
        let streamed = self.edge_query(&statement)?;
        let mut result = memory;
        result.extend(streamed);
        if labels.is_empty() {
            if let Some(entry) = self.vertices.get_mut(&vertex) {
                if direction.includes_outgoing() {
                    entry.set_out_edges_loaded();
                }
                if direction.includes_incoming() {
                    entry.set_in_edges_loaded();
                }
            }
        }
        Ok(result)
    }

    /// Neighbor vertices of a vertex through incident edges, optionally
    /// filtered by edge label.
    pub fn vertex_neighbors(
        &mut self,
        vertex: VertexId,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Vec<VertexId>> {
        self.read_write()?;
        let (out_snapshot, in_snapshot, loaded, _) = self.incident_snapshot(vertex, direction)?;
        let pattern = {
            let entry = self.vertices.get(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
            entry.match_pattern(None, "id")
        };
        let mut memory: Vec<VertexId> = Vec::new();
        for id in out_snapshot.iter().filter(|id| self.edge_has_label(**id, labels)) {
            if let Some(edge) = self.edges.get(id) {
                memory.push(edge.target());
            }
        }
        for id in in_snapshot.iter().filter(|id| self.edge_has_label(**id, labels)) {
            if let Some(edge) = self.edges.get(id) {
                memory.push(edge.source());
            }
        }
        if loaded {
            return Ok(memory);
        }
        let known: Vec<EdgeId> = out_snapshot.iter().chain(in_snapshot.iter()).copied().collect();
        let statement = self.incident_statement(&pattern, vertex, direction, labels, &known, "m");
        let streamed = self.vertex_query(&statement)?;
        let mut result = memory;
        result.extend(streamed);
        Ok(result)
    }

    fn incident_snapshot(
        &self,
        vertex: VertexId,
        direction: Direction,
    ) -> Result<(Vec<EdgeId>, Vec<EdgeId>, bool, String)> {
        let entry = self.vertices.get(&vertex).ok_or(Error::VertexNotFound(vertex.as_i64()))?;
        let mut out_snapshot: Vec<EdgeId> = Vec::new();
        let mut in_snapshot: Vec<EdgeId> = Vec::new();
        if direction.includes_outgoing() {
            out_snapshot.extend(entry.out_edges().iter().copied());
            out_snapshot.sort_unstable();
        }
        if direction.includes_incoming() {
            in_snapshot.extend(entry.in_edges().iter().copied());
            in_snapshot.sort_unstable();
            // a self-loop sits in both adjacency sets
            in_snapshot.retain(|id| !out_snapshot.contains(id));
        }
        let loaded = match direction {
            Direction::Outgoing => entry.out_edges_loaded(),
            Direction::Incoming => entry.in_edges_loaded(),
            Direction::Both => entry.out_edges_loaded() && entry.in_edges_loaded(),
        };
        Ok((out_snapshot, in_snapshot, loaded, entry.match_pattern(Some("n"), "id")))
    }

    fn edge_has_label(&self, id: EdgeId, labels: &[&str]) -> bool {
        match self.edges.get(&id) {
            Some(edge) => labels.is_empty() || labels.contains(&edge.label().as_str()),
            None => false,
        }
    }

    fn incident_statement(
        &self,
        pattern: &str,
        vertex: VertexId,
        direction: Direction,
        labels: &[&str],
        known: &[EdgeId],
        returns: &str,
    ) -> Statement {
        let (open, close) = match direction {
            Direction::Outgoing => ("-", "->"),
            Direction::Incoming => ("<-", "-"),
            Direction::Both => ("-", "-"),
        };
        let relationship = match labels {
            [] => "r".to_owned(),
            [label] => format!("r:`{label}`"),
            // multi-label filters keep the caller's ordering
            _ => format!(
                "r:{}",
                labels.iter().map(|label| format!("`{label}`")).collect::<Vec<_>>().join("|:")
            ),
        };
        let mut text = format!("MATCH {pattern}{open}[{relationship}]{close}(m)");
        let mut parameters = HashMap::new();
        parameters.insert("id".to_owned(), Value::Int(vertex.as_i64()));
        let label_values =
            || Value::List(labels.iter().map(|label| Value::String((*label).to_owned())).collect());
        if !known.is_empty() {
            text.push_str(&format!(" WHERE NOT r.{} IN $ids", self.edge_id_field));
            parameters.insert(
                "ids".to_owned(),
                Value::List(known.iter().map(|id| Value::Int(id.as_i64())).collect()),
            );
            if labels.len() > 1 {
                text.push_str(" AND type(r) IN $labels");
                parameters.insert("labels".to_owned(), label_values());
            }
        } else if labels.len() > 1 {
            text.push_str(" WHERE type(r) IN $labels");
            parameters.insert("labels".to_owned(), label_values());
        }
        text.push_str(&format!(" RETURN {returns}"));
        Statement::with_parameters(text, parameters)
    }

    // ========================================================================
    // Query-to-stream bridge
    // ========================================================================

    /// Execute an arbitrary statement on the session's transaction.
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<RecordStream> {
        self.read_write()?;
        let transaction = self.transaction.as_mut().ok_or(Error::NoTransaction)?;
        debug!(statement = %statement, "executing statement");
        Ok(transaction.run(statement)?)
    }

    /// Run a statement whose records carry a node in column 0 and surface
    /// the resulting vertices.
    pub fn vertices_by_statement(&mut self, statement: &Statement) -> Result<Vec<VertexId>> {
        self.vertex_query(statement)
    }

    /// Run a statement whose records carry `n, r, m` columns and surface the
    /// resulting edges.
    pub fn edges_by_statement(&mut self, statement: &Statement) -> Result<Vec<EdgeId>> {
        self.edge_query(statement)
    }

    /// Create an index on a label/property pair.
    pub fn create_index(&mut self, label: &str, property: &str) -> Result<()> {
        let statement = Statement::new(format!("CREATE INDEX ON :`{label}`({property})"));
        self.execute_statement(&statement)?;
        Ok(())
    }

    fn vertex_query(&mut self, statement: &Statement) -> Result<Vec<VertexId>> {
        let stream = self.execute_statement(statement)?;
        let mut result = Vec::new();
        for record in stream {
            let record = record?;
            if let Some(id) = self.load_vertex(&record)? {
                result.push(id);
            }
        }
        Ok(result)
    }

    fn edge_query(&mut self, statement: &Statement) -> Result<Vec<EdgeId>> {
        let stream = self.execute_statement(statement)?;
        let mut result = Vec::new();
        for record in stream {
            let record = record?;
            if let Some(id) = self.load_edge(&record)? {
                result.push(id);
            }
        }
        Ok(result)
    }

    /// Reconcile a streamed node with the working set.
    ///
    /// Deleted vertices and vertices outside the read partition are skipped;
    /// a resident vertex wins over the streamed row.
    fn load_vertex(&mut self, record: &Record) -> Result<Option<VertexId>> {
        let node = record
            .get(0)
            .and_then(RecordValue::as_node)
            .ok_or_else(|| Error::consistency("expected a node in record column 0"))?;
        let raw = node.get(&self.vertex_id_field).ok_or_else(|| {
            Error::consistency(format!("node is missing identifier field {:?}", self.vertex_id_field))
        })?;
        let id = VertexId::new(self.vertex_id_provider.canonicalize(raw)?);
        if self.deleted_vertices.contains(&id) {
            return Ok(None);
        }
        let labels: BTreeSet<Label> =
            node.labels().iter().map(|label| Label::new(label.as_str())).collect();
        if !self.partition.contains_vertex(&labels) {
            return Ok(None);
        }
        if self.vertices.contains_key(&id) {
            return Ok(Some(id));
        }
        let vertex = Vertex::from_node(
            id,
            self.vertex_id_field.clone(),
            node,
            self.property_id_provider.as_ref(),
        )?;
        self.vertices.insert(id, vertex);
        Ok(Some(id))
    }

    /// Reconcile a streamed `n, r, m` record with the working set.
    fn load_edge(&mut self, record: &Record) -> Result<Option<EdgeId>> {
        let relationship = record
            .get(1)
            .and_then(RecordValue::as_relationship)
            .ok_or_else(|| Error::consistency("expected a relationship in record column 1"))?;
        let raw = relationship.get(&self.edge_id_field).ok_or_else(|| {
            Error::consistency(format!(
                "relationship is missing identifier field {:?}",
                self.edge_id_field
            ))
        })?;
        let id = EdgeId::new(self.edge_id_provider.canonicalize(raw)?);
        if self.deleted_edges.contains(&id) {
            return Ok(None);
        }
        if self.edges.contains_key(&id) {
            return Ok(Some(id));
        }
        let first = record
            .get(0)
            .and_then(RecordValue::as_node)
            .ok_or_else(|| Error::consistency("expected a node in record column 0"))?;
        let second = record
            .get(2)
            .and_then(RecordValue::as_node)
            .ok_or_else(|| Error::consistency("expected a node in record column 2"))?;
        let first_raw = first.get(&self.vertex_id_field).ok_or_else(|| {
            Error::consistency(format!("node is missing identifier field {:?}", self.vertex_id_field))
        })?;
        let second_raw = second.get(&self.vertex_id_field).ok_or_else(|| {
            Error::consistency(format!("node is missing identifier field {:?}", self.vertex_id_field))
        })?;
        let first_id = VertexId::new(self.vertex_id_provider.canonicalize(first_raw)?);
        let second_id = VertexId::new(self.vertex_id_provider.canonicalize(second_raw)?);
        // an edge whose endpoint was deleted or is outside the partition is
        // not observable
        if self.deleted_vertices.contains(&first_id) || self.deleted_vertices.contains(&second_id) {
            return Ok(None);
        }
        let first_labels: BTreeSet<Label> =
            first.labels().iter().map(|label| Label::new(label.as_str())).collect();
        let second_labels: BTreeSet<Label> =
            second.labels().iter().map(|label| Label::new(label.as_str())).collect();
        if !self.partition.contains_vertex(&first_labels)
            || !self.partition.contains_vertex(&second_labels)
        {
            return Ok(None);
        }
        if !self.vertices.contains_key(&first_id) {
            let vertex = Vertex::from_node(
                first_id,
                self.vertex_id_field.clone(),
                first,
                self.property_id_provider.as_ref(),
            )?;
            self.vertices.insert(first_id, vertex);
        }
        if !self.vertices.contains_key(&second_id) {
            let vertex = Vertex::from_node(
                second_id,
                self.vertex_id_field.clone(),
                second,
                self.property_id_provider.as_ref(),
            )?;
            self.vertices.insert(second_id, vertex);
        }
        // the relationship may come back in either orientation
        let (source, target) = if relationship.start_node_id() == first.id() {
            (first_id, second_id)
        } else {
            (second_id, first_id)
        };
        let edge =
            Edge::from_relationship(id, self.edge_id_field.clone(), relationship, source, target)?;
        if let Some(vertex) = self.vertices.get_mut(&source) {
            vertex.add_out_edge(id);
        }
        if let Some(vertex) = self.vertices.get_mut(&target) {
            vertex.add_in_edge(id);
        }
        self.edges.insert(id, edge);
        Ok(Some(id))
    }

    // ========================================================================
    // Commit flush
    // ========================================================================

    /// Flush staged mutations in dependency order: edge deletes, vertex
    /// deletes, vertex creates, edge creates, edge updates, vertex updates.
    /// Vertex updates run last so edges that match endpoints by label still
    /// see the pre-update labels.
    fn flush(&mut self) -> Result<()> {
        let statements = self.delete_edge_statements()?;
        self.run_statements(statements)?;
        let statements = self.delete_vertex_statements();
        self.run_statements(statements)?;
        let statements = self.create_vertex_statements();
        self.run_statements(statements)?;
        let statements = self.create_edge_statements()?;
        self.run_statements(statements)?;
        let statements = self.update_edge_statements()?;
        self.run_statements(statements)?;
        let statements = self.update_vertex_statements();
        self.run_statements(statements)
    }

    fn run_statements(&mut self, statements: Vec<Statement>) -> Result<()> {
        for statement in statements {
            self.execute_statement(&statement)?;
        }
        Ok(())
    }

    /// Resolve a vertex for statement generation, looking through the delete
    /// queue for vertices that are being removed in this transaction.
    fn statement_vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(&id)
            .or_else(|| self.vertex_delete_queue.get(&id))
            .ok_or_else(|| Error::consistency(format!("edge endpoint {} is missing", id.as_i64())))
    }

    fn delete_edge_statements(&self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        for entry in self.edge_delete_queue.values() {
            if !entry.explicit {
                continue;
            }
            let out_pattern = self.statement_vertex(entry.edge.source())?.match_pattern(Some("o"), "oid");
            let in_pattern = self.statement_vertex(entry.edge.target())?.match_pattern(Some("i"), "iid");
            statements.push(entry.edge.delete_statement(&out_pattern, &in_pattern));
        }
        Ok(statements)
    }

    fn delete_vertex_statements(&self) -> Vec<Statement> {
        self.vertex_delete_queue.values().map(Vertex::delete_statement).collect()
    }

    fn create_vertex_statements(&mut self) -> Vec<Statement> {
        let ids = self.transient_vertices.clone();
        let mut statements = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(vertex) = self.vertices.get_mut(&id) {
                statements.push(vertex.insert_statement());
            }
        }
        statements
    }

    fn create_edge_statements(&mut self) -> Result<Vec<Statement>> {
        let ids = self.transient_edges.clone();
        let mut statements = Vec::with_capacity(ids.len());
        for id in ids {
            let (out_pattern, in_pattern) = {
                let edge = self
                    .edges
                    .get(&id)
                    .ok_or_else(|| Error::consistency(format!("transient edge {} is missing", id.as_i64())))?;
                (
                    self.statement_vertex(edge.source())?.match_pattern(Some("o"), "oid"),
                    self.statement_vertex(edge.target())?.match_pattern(Some("i"), "iid"),
                )
            };
            if let Some(edge) = self.edges.get_mut(&id) {
                statements.push(edge.insert_statement(&out_pattern, &in_pattern));
            }
        }
        Ok(statements)
    }

    fn update_edge_statements(&mut self) -> Result<Vec<Statement>> {
        let ids: Vec<EdgeId> = self.edge_update_queue.iter().copied().collect();
        let mut statements = Vec::with_capacity(ids.len());
        for id in ids {
            let (out_pattern, in_pattern) = {
                let edge = self
                    .edges
                    .get(&id)
                    .ok_or_else(|| Error::consistency(format!("updated edge {} is missing", id.as_i64())))?;
                (
                    self.statement_vertex(edge.source())?.match_pattern(Some("o"), "oid"),
                    self.statement_vertex(edge.target())?.match_pattern(Some("i"), "iid"),
                )
            };
            if let Some(edge) = self.edges.get_mut(&id) {
                statements.push(edge.update_statement(&out_pattern, &in_pattern));
            }
        }
        Ok(statements)
    }

    fn update_vertex_statements(&mut self) -> Vec<Statement> {
        let ids: Vec<VertexId> = self.vertex_update_queue.iter().copied().collect();
        let mut statements = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(vertex) = self.vertices.get_mut(&id) {
                if let Some(statement) = vertex.update_statement() {
                    statements.push(statement);
                }
            }
        }
        statements
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.driver_session.is_open() {
            error!("session dropped without an explicit close(), the code is leaking sessions");
            self.close_transaction();
            if let Err(e) = self.driver_session.close() {
                debug!(error = %e, "error closing leaked session");
            }
        }
    }
}

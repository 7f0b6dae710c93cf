//! Edge state machine: single-valued properties, rollback snapshot, and
//! statement emission.

use std::collections::HashMap;

use trellis_core::{EdgeId, Label, Value, VertexId};
use trellis_driver::record::Relationship;
use trellis_driver::Statement;

use crate::cypher;
use crate::error::{Error, Result};

/// An edge in the session's working set.
///
/// Edges reference their endpoint vertices through [`VertexId`] handles; the
/// session resolves them. The source endpoint is the `out` side of the
/// relationship, the target the `in` side. The label is immutable after
/// creation.
#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,
    id_field_name: String,
    label: Label,
    source: VertexId,
    target: VertexId,
    properties: HashMap<String, Value>,
    original_properties: HashMap<String, Value>,
    dirty: bool,
    transient: bool,
}

impl Edge {
    /// Create a transient edge between two session vertices.
    pub(crate) fn new(
        id: EdgeId,
        id_field_name: String,
        label: Label,
        source: VertexId,
        target: VertexId,
    ) -> Self {
        Self {
            id,
            id_field_name,
            label,
            source,
            target,
            properties: HashMap::new(),
            original_properties: HashMap::new(),
            dirty: false,
            transient: true,
        }
    }

    /// Materialize a persisted edge from a streamed relationship.
    ///
    /// Properties are copied from the relationship, skipping the identifier
    /// field.
    pub(crate) fn from_relationship(
        id: EdgeId,
        id_field_name: String,
        relationship: &Relationship,
        source: VertexId,
        target: VertexId,
    ) -> Result<Self> {
        let mut properties = HashMap::new();
        for key in relationship.keys() {
            if key == id_field_name {
                continue;
            }
            let Some(value) = relationship.get(key) else { continue };
            if matches!(value, Value::Map(_)) {
                return Err(Error::consistency(format!(
                    "map-typed property {key:?} is not supported"
                )));
            }
            properties.insert(key.to_owned(), value.clone());
        }
        Ok(Self {
            id,
            id_field_name,
            label: Label::new(relationship.type_name()),
            source,
            target,
            original_properties: properties.clone(),
            properties,
            dirty: false,
            transient: false,
        })
    }

    /// The edge identifier.
    #[must_use]
    pub const fn id(&self) -> EdgeId {
        self.id
    }

    /// The edge label.
    #[must_use]
    pub const fn label(&self) -> &Label {
        &self.label
    }

    /// The source (out) endpoint.
    #[must_use]
    pub const fn source(&self) -> VertexId {
        self.source
    }

    /// The target (in) endpoint.
    #[must_use]
    pub const fn target(&self) -> VertexId {
        self.target
    }

    /// Returns `true` if the edge has uncommitted property changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if the edge was created in the current transaction and
    /// has not been committed yet.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.transient
    }

    /// Look up a property value by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// All properties on this edge.
    #[must_use]
    pub const fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    /// Set a property value, replacing any previous one.
    pub(crate) fn set_property(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
        self.dirty = true;
    }

    /// Remove a property value. Returns `true` if the key was present.
    pub(crate) fn remove_property(&mut self, key: &str) -> bool {
        if self.properties.remove(key).is_some() {
            self.dirty = true;
            return true;
        }
        false
    }

    fn statement_parameters(&self) -> HashMap<String, Value> {
        let mut parameters = self.properties.clone();
        parameters.insert(self.id_field_name.clone(), Value::Int(self.id.as_i64()));
        parameters
    }

    /// Emit the CREATE statement for a transient edge.
    ///
    /// `out_pattern` and `in_pattern` are the endpoint MATCH patterns with
    /// aliases `o`/`i` and id parameters `$oid`/`$iid`.
    pub(crate) fn insert_statement(&mut self, out_pattern: &str, in_pattern: &str) -> Statement {
        let text = format!(
            "MATCH {}, {} CREATE (o)-[r:{} $ep]->(i)",
            out_pattern,
            in_pattern,
            cypher::quote(&self.label)
        );
        self.dirty = false;
        Statement::new(text)
            .with_parameter("oid", self.source.as_i64())
            .with_parameter("iid", self.target.as_i64())
            .with_parameter("ep", Value::Map(self.statement_parameters()))
    }

    /// Emit the MERGE statement for a dirty edge.
    pub(crate) fn update_statement(&mut self, out_pattern: &str, in_pattern: &str) -> Statement {
        let text = format!(
            "MATCH {}, {} MERGE (o)-[r:{}{{{}: $id}}]->(i) ON MATCH SET r = $rp",
            out_pattern,
            in_pattern,
            cypher::quote(&self.label),
            self.id_field_name
        );
        self.dirty = false;
        Statement::new(text)
            .with_parameter("oid", self.source.as_i64())
            .with_parameter("iid", self.target.as_i64())
            .with_parameter("id", self.id.as_i64())
            .with_parameter("rp", Value::Map(self.statement_parameters()))
    }

    /// Emit the DELETE statement for this edge.
    pub(crate) fn delete_statement(&self, out_pattern: &str, in_pattern: &str) -> Statement {
        let text = format!(
            "MATCH {}-[r:{}{{{}: $id}}]->{} DELETE r",
            out_pattern,
            cypher::quote(&self.label),
            self.id_field_name,
            in_pattern
        );
        Statement::new(text)
            .with_parameter("oid", self.source.as_i64())
            .with_parameter("iid", self.target.as_i64())
            .with_parameter("id", self.id.as_i64())
    }

    /// Adopt the current state as committed.
    pub(crate) fn finalize_commit(&mut self) {
        self.original_properties = self.properties.clone();
        self.dirty = false;
        self.transient = false;
    }

    /// Restore the last committed property state.
    pub(crate) fn rollback(&mut self) {
        self.properties = self.original_properties.clone();
        self.dirty = false;
    }
}

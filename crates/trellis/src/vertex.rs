//! Vertex state machine: labels, multi-valued properties, rollback
//! snapshots, and statement emission.
//!
//! A `Vertex` lives inside a session's registry and references its incident
//! edges through [`EdgeId`] handles; the session resolves them. Mutations go
//! through the session so dirty elements land in the update queue.

use std::collections::{BTreeSet, HashMap, HashSet};

use trellis_core::{join_labels, Cardinality, EdgeId, Label, PropertyId, Value, VertexId};
use trellis_driver::record::Node;
use trellis_driver::Statement;

use crate::cypher;
use crate::error::{Error, Result};
use crate::provider::ElementIdProvider;

/// A single value stored under a vertex property key.
///
/// Vertex properties carry their own identifiers so individual values of a
/// multi-valued key can be addressed and removed. Equality is the
/// `(id, key, value)` triple, which is also the uniqueness rule for
/// set-cardinality keys.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexProperty {
    id: PropertyId,
    key: String,
    value: Value,
}

impl VertexProperty {
    /// Create a property value.
    #[must_use]
    pub fn new(id: PropertyId, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { id, key: key.into(), value: value.into() }
    }

    /// The property identifier.
    #[must_use]
    pub const fn id(&self) -> PropertyId {
        self.id
    }

    /// The property key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The property value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

/// A vertex in the session's working set.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    id_field_name: String,
    labels: BTreeSet<Label>,
    /// The last committed label set, used to match the vertex on the server.
    match_labels: BTreeSet<Label>,
    labels_added: BTreeSet<Label>,
    labels_removed: BTreeSet<Label>,
    original_labels: BTreeSet<Label>,
    properties: HashMap<String, Vec<VertexProperty>>,
    cardinalities: HashMap<String, Cardinality>,
    original_properties: HashMap<String, Vec<VertexProperty>>,
    original_cardinalities: HashMap<String, Cardinality>,
    out_edges: HashSet<EdgeId>,
    in_edges: HashSet<EdgeId>,
    out_edges_loaded: bool,
    in_edges_loaded: bool,
    dirty: bool,
}

impl Vertex {
    /// Create a transient vertex with the given labels.
    pub(crate) fn new(id: VertexId, id_field_name: String, labels: BTreeSet<Label>) -> Self {
        Self {
            id,
            id_field_name,
            match_labels: labels.clone(),
            original_labels: labels.clone(),
            labels,
            labels_added: BTreeSet::new(),
            labels_removed: BTreeSet::new(),
            properties: HashMap::new(),
            cardinalities: HashMap::new(),
            original_properties: HashMap::new(),
            original_cardinalities: HashMap::new(),
            out_edges: HashSet::new(),
            in_edges: HashSet::new(),
            out_edges_loaded: false,
            in_edges_loaded: false,
            dirty: false,
        }
    }

    /// Materialize a persisted vertex from a streamed node.
    ///
    /// Properties are copied from the node, skipping the identifier field; a
    /// list-valued property becomes a list-cardinality key, every other
    /// value a single-cardinality key. Property identifiers are allocated
    /// from the given provider.
    pub(crate) fn from_node(
        id: VertexId,
        id_field_name: String,
        node: &Node,
        property_ids: &dyn ElementIdProvider,
    ) -> Result<Self> {
        let labels: BTreeSet<Label> =
            node.labels().iter().map(|label| Label::new(label.as_str())).collect();
        let mut vertex = Self::new(id, id_field_name, labels);
        for key in node.keys() {
            if key == vertex.id_field_name {
                continue;
            }
            let Some(value) = node.get(key) else { continue };
            match value {
                Value::List(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        let property_id = PropertyId::new(property_ids.generate()?);
                        values.push(VertexProperty::new(property_id, key, item.clone()));
                    }
                    vertex.properties.insert(key.to_owned(), values);
                    vertex.cardinalities.insert(key.to_owned(), Cardinality::List);
                }
                Value::Map(_) => {
                    return Err(Error::consistency(format!(
                        "map-typed property {key:?} is not supported"
                    )));
                }
                other => {
                    let property_id = PropertyId::new(property_ids.generate()?);
                    vertex.properties.insert(
                        key.to_owned(),
                        vec![VertexProperty::new(property_id, key, other.clone())],
                    );
                    vertex.cardinalities.insert(key.to_owned(), Cardinality::Single);
                }
            }
        }
        vertex.original_properties = vertex.properties.clone();
        vertex.original_cardinalities = vertex.cardinalities.clone();
        Ok(vertex)
    }

    /// The vertex identifier.
    #[must_use]
    pub const fn id(&self) -> VertexId {
        self.id
    }

    /// All labels joined with `::`.
    #[must_use]
    pub fn label(&self) -> String {
        join_labels(&self.labels)
    }

    /// The vertex's labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<Label> {
        &self.labels
    }

    /// Check if the vertex has a specific label.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    /// Returns `true` if the vertex has uncommitted property or label
    /// changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The cardinality bound to a property key, if any.
    #[must_use]
    pub fn cardinality(&self, key: &str) -> Option<Cardinality> {
        self.cardinalities.get(key).copied()
    }

    /// The sole property value for a key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MultipleProperties`] when the key holds more than
    /// one value.
    pub fn property(&self, key: &str) -> Result<Option<&VertexProperty>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(values) if values.len() <= 1 => Ok(values.first()),
            Some(_) => Err(Error::MultipleProperties(key.to_owned())),
        }
    }

    /// All property values for the given keys, or every property when no
    /// keys are given. Values of one key keep their insertion order.
    #[must_use]
    pub fn properties(&self, keys: &[&str]) -> Vec<&VertexProperty> {
        if keys.is_empty() {
            let mut all_keys: Vec<&String> = self.properties.keys().collect();
            all_keys.sort();
            return all_keys
                .into_iter()
                .filter_map(|key| self.properties.get(key))
                .flatten()
                .collect();
        }
        keys.iter().filter_map(|key| self.properties.get(*key)).flatten().collect()
    }

    /// Add a label, recording the delta for the next update statement.
    ///
    /// Returns `true` if the label set changed and the session should mark
    /// the vertex dirty. Re-adding a label removed earlier in the
    /// transaction just cancels the pending removal.
    pub(crate) fn add_label(&mut self, label: Label) -> bool {
        if self.labels.insert(label.clone()) {
            if !self.labels_removed.remove(&label) {
                self.labels_added.insert(label);
            }
            return true;
        }
        false
    }

    /// Remove a label.
    ///
    /// Returns `true` if a removal delta was recorded; a label added earlier
    /// in the transaction just retracts the pending addition.
    pub(crate) fn remove_label(&mut self, label: &Label) -> bool {
        if self.labels.remove(label) {
            if !self.labels_added.remove(label) {
                self.labels_removed.insert(label.clone());
                return true;
            }
        }
        false
    }

    /// Store a property value under the given cardinality.
    ///
    /// Returns `true` if the vertex became dirty (a set-cardinality add of
    /// an already-present value is a no-op).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CardinalityConflict`] when the key is already bound
    /// to a different cardinality.
    pub(crate) fn set_property(
        &mut self,
        cardinality: Cardinality,
        property: VertexProperty,
    ) -> Result<bool> {
        let key = property.key().to_owned();
        if let Some(existing) = self.cardinalities.get(&key) {
            if *existing != cardinality {
                return Err(Error::CardinalityConflict { key, existing: *existing });
            }
        }
        match cardinality {
            Cardinality::Single => {
                self.properties.insert(key.clone(), vec![property]);
                self.cardinalities.insert(key, Cardinality::Single);
                self.dirty = true;
                Ok(true)
            }
            Cardinality::List => {
                self.properties.entry(key.clone()).or_default().push(property);
                self.cardinalities.insert(key, Cardinality::List);
                self.dirty = true;
                Ok(true)
            }
            Cardinality::Set => {
                let values = self.properties.entry(key.clone()).or_default();
                if values.contains(&property) {
                    return Ok(false);
                }
                values.push(property);
                self.cardinalities.insert(key, Cardinality::Set);
                self.dirty = true;
                Ok(true)
            }
        }
    }

    /// Remove a single property value by its identifier.
    ///
    /// Returns `true` if a value was removed (and the vertex became dirty).
    pub(crate) fn remove_property(&mut self, property: PropertyId) -> bool {
        let Some(key) = self
            .properties
            .iter()
            .find(|(_, values)| values.iter().any(|p| p.id() == property))
            .map(|(key, _)| key.clone())
        else {
            return false;
        };
        if let Some(values) = self.properties.get_mut(&key) {
            values.retain(|p| p.id() != property);
            if values.is_empty() {
                self.properties.remove(&key);
                self.cardinalities.remove(&key);
            }
        }
        self.dirty = true;
        true
    }

    /// Identifiers of outgoing incident edges known to the session.
    #[must_use]
    pub const fn out_edges(&self) -> &HashSet<EdgeId> {
        &self.out_edges
    }

    /// Identifiers of incoming incident edges known to the session.
    #[must_use]
    pub const fn in_edges(&self) -> &HashSet<EdgeId> {
        &self.in_edges
    }

    pub(crate) fn add_out_edge(&mut self, edge: EdgeId) {
        self.out_edges.insert(edge);
    }

    pub(crate) fn add_in_edge(&mut self, edge: EdgeId) {
        self.in_edges.insert(edge);
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeId) {
        self.out_edges.remove(&edge);
        self.in_edges.remove(&edge);
    }

    pub(crate) const fn out_edges_loaded(&self) -> bool {
        self.out_edges_loaded
    }

    pub(crate) const fn in_edges_loaded(&self) -> bool {
        self.in_edges_loaded
    }

    pub(crate) fn set_out_edges_loaded(&mut self) {
        self.out_edges_loaded = true;
    }

    pub(crate) fn set_in_edges_loaded(&mut self) {
        self.in_edges_loaded = true;
    }

    /// Generate the MATCH pattern for this vertex, e.g.
    /// `` (alias:`Label1`:`Label2`{id: $idParameter}) ``.
    ///
    /// The pattern matches through the label set as of the last commit, so
    /// statements still locate the vertex while label changes are pending.
    pub(crate) fn match_pattern(&self, alias: Option<&str>, id_parameter: &str) -> String {
        format!(
            "({}{}{{{}: ${}}})",
            alias.unwrap_or(""),
            cypher::label_prefix(&self.match_labels),
            self.id_field_name,
            id_parameter
        )
    }

    fn statement_parameters(&self) -> HashMap<String, Value> {
        let mut parameters = HashMap::new();
        for (key, values) in &self.properties {
            if self.cardinalities.get(key) == Some(&Cardinality::Single) {
                if let Some(first) = values.first() {
                    parameters.insert(key.clone(), first.value().clone());
                }
            } else {
                parameters.insert(
                    key.clone(),
                    Value::List(values.iter().map(|p| p.value().clone()).collect()),
                );
            }
        }
        parameters.insert(self.id_field_name.clone(), Value::Int(self.id.as_i64()));
        parameters
    }

    /// Emit the CREATE statement for a transient vertex.
    ///
    /// Emission resets the dirty flag and label deltas and refreshes the
    /// match labels to the current label set.
    pub(crate) fn insert_statement(&mut self) -> Statement {
        let text = format!("CREATE (:{} $vp)", cypher::label_fragment(&self.labels));
        let statement =
            Statement::new(text).with_parameter("vp", Value::Map(self.statement_parameters()));
        self.reset_deltas();
        statement
    }

    /// Emit the MERGE statement for a dirty vertex, or `None` when there is
    /// nothing to persist (adding and removing the same label nets out).
    pub(crate) fn update_statement(&mut self) -> Option<Statement> {
        if !self.dirty && self.labels_added.is_empty() && self.labels_removed.is_empty() {
            return None;
        }
        let mut text = format!("MERGE {}", self.match_pattern(Some("v"), "id"));
        let mut parameters = HashMap::new();
        parameters.insert("id".to_owned(), Value::Int(self.id.as_i64()));
        if self.dirty {
            text.push_str(" ON MATCH SET v = $vp");
            parameters.insert("vp".to_owned(), Value::Map(self.statement_parameters()));
        }
        if !self.labels_added.is_empty() {
            text.push_str(if self.dirty { ", v" } else { " ON MATCH SET v" });
            text.push_str(&cypher::label_prefix(&self.labels_added));
        }
        if !self.labels_removed.is_empty() {
            text.push_str(" REMOVE v");
            text.push_str(&cypher::label_prefix(&self.labels_removed));
        }
        let statement = Statement::with_parameters(text, parameters);
        self.reset_deltas();
        Some(statement)
    }

    /// Emit the DETACH DELETE statement for this vertex.
    pub(crate) fn delete_statement(&self) -> Statement {
        let text = format!("MATCH {} DETACH DELETE v", self.match_pattern(Some("v"), "id"));
        Statement::new(text).with_parameter("id", self.id.as_i64())
    }

    fn reset_deltas(&mut self) {
        self.dirty = false;
        self.labels_added.clear();
        self.labels_removed.clear();
        self.match_labels = self.labels.clone();
    }

    /// Adopt the current state as committed.
    pub(crate) fn finalize_commit(&mut self) {
        self.original_properties = self.properties.clone();
        self.original_cardinalities = self.cardinalities.clone();
        self.original_labels = self.labels.clone();
        self.reset_deltas();
    }

    /// Restore the last committed state.
    pub(crate) fn rollback(&mut self) {
        self.properties = self.original_properties.clone();
        self.cardinalities = self.original_cardinalities.clone();
        self.labels = self.original_labels.clone();
        self.labels_added.clear();
        self.labels_removed.clear();
        self.match_labels = self.labels.clone();
        self.dirty = false;
    }
}

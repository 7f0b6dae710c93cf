//! Records streamed back from the back-end.
//!
//! A [`Record`] is one row of a statement result. Each column is a
//! [`RecordValue`]: either a scalar [`Value`], a [`Node`], or a
//! [`Relationship`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trellis_core::Value;

/// A node as surfaced by the back-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: i64,
    labels: Vec<String>,
    properties: HashMap<String, Value>,
}

impl Node {
    /// Create a node with the given native identifier and labels.
    #[must_use]
    pub fn new(id: i64, labels: Vec<String>) -> Self {
        Self { id, labels, properties: HashMap::new() }
    }

    /// Add a property to this node.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The back-end's native identifier for this node.
    ///
    /// This is distinct from the property-stored element id; it is only used
    /// to orient relationships against their endpoint nodes.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// The node's labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The property keys present on this node.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Look up a property value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A relationship as surfaced by the back-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    id: i64,
    start_node_id: i64,
    end_node_id: i64,
    type_name: String,
    properties: HashMap<String, Value>,
}

impl Relationship {
    /// Create a relationship between two native node identifiers.
    #[must_use]
    pub fn new(
        id: i64,
        start_node_id: i64,
        end_node_id: i64,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            start_node_id,
            end_node_id,
            type_name: type_name.into(),
            properties: HashMap::new(),
        }
    }

    /// Add a property to this relationship.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The back-end's native identifier for this relationship.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// The native identifier of the node the relationship starts at.
    #[must_use]
    pub const fn start_node_id(&self) -> i64 {
        self.start_node_id
    }

    /// The native identifier of the node the relationship ends at.
    #[must_use]
    pub const fn end_node_id(&self) -> i64 {
        self.end_node_id
    }

    /// The relationship type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The property keys present on this relationship.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Look up a property value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// One column of a streamed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    /// A scalar value.
    Scalar(Value),
    /// A node.
    Node(Node),
    /// A relationship.
    Relationship(Relationship),
}

impl RecordValue {
    /// Returns the column as a scalar value if it is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the column as an integer if it is a scalar integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Scalar(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns the column as a node if it is one.
    #[must_use]
    pub const fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the column as a relationship if it is one.
    #[must_use]
    pub const fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Self::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }
}

/// One row of a statement result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<RecordValue>,
}

impl Record {
    /// Create a record from its columns.
    #[must_use]
    pub fn new(values: Vec<RecordValue>) -> Self {
        Self { values }
    }

    /// Get a column by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RecordValue> {
        self.values.get(index)
    }

    /// The number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

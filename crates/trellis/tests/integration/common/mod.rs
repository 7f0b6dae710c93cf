//! Shared fixtures: a counter-backed identifier provider and record
//! builders shaped like the rows the back-end streams.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use trellis::{ElementIdProvider, Error, Graph, Result, Session, Value};
use trellis_driver::backends::MockDriver;
use trellis_driver::{Node, Record, RecordValue, Relationship};

/// A process-local provider handing out identifiers from an atomic counter.
pub struct TestIdProvider {
    counter: AtomicI64,
}

impl TestIdProvider {
    pub fn starting_at(first: i64) -> Arc<Self> {
        Arc::new(Self { counter: AtomicI64::new(first - 1) })
    }
}

impl ElementIdProvider for TestIdProvider {
    fn field_name(&self) -> &str {
        "id"
    }

    fn generate(&self) -> Result<i64> {
        Ok(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn canonicalize(&self, raw: &Value) -> Result<i64> {
        raw.as_int().ok_or_else(|| Error::InvalidId(raw.type_name().to_owned()))
    }
}

/// Vertex ids start at 1, edge ids at 1001, property ids at 9001.
pub fn graph(driver: &MockDriver) -> Graph {
    Graph::new(
        Arc::new(driver.clone()),
        TestIdProvider::starting_at(1),
        TestIdProvider::starting_at(1001),
        TestIdProvider::starting_at(9001),
    )
}

pub fn session(driver: &MockDriver) -> Session {
    graph(driver).session().expect("session")
}

/// A node column carrying the property-stored identifier.
pub fn node(id: i64, native: i64, labels: &[&str], properties: &[(&str, Value)]) -> Node {
    let mut node = Node::new(native, labels.iter().map(|label| (*label).to_owned()).collect())
        .with_property("id", id);
    for (key, value) in properties {
        node = node.with_property(*key, value.clone());
    }
    node
}

/// A single-column record returning a vertex.
pub fn vertex_record(id: i64, native: i64, labels: &[&str], properties: &[(&str, Value)]) -> Record {
    Record::new(vec![RecordValue::Node(node(id, native, labels, properties))])
}

/// An `n, r, m` record returning an edge between two vertices.
///
/// The relationship runs from the first node to the second in native-id
/// space, so the first node is the out endpoint.
pub fn edge_record(
    edge_id: i64,
    label: &str,
    out: (i64, i64, &[&str]),
    in_: (i64, i64, &[&str]),
    properties: &[(&str, Value)],
) -> Record {
    let (out_id, out_native, out_labels) = out;
    let (in_id, in_native, in_labels) = in_;
    let mut relationship =
        Relationship::new(edge_id, out_native, in_native, label).with_property("id", edge_id);
    for (key, value) in properties {
        relationship = relationship.with_property(*key, value.clone());
    }
    Record::new(vec![
        RecordValue::Node(node(out_id, out_native, out_labels, &[])),
        RecordValue::Relationship(relationship),
        RecordValue::Node(node(in_id, in_native, in_labels, &[])),
    ])
}

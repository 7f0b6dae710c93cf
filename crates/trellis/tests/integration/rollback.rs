//! Rollback: transient eviction, snapshot restoration, and adjacency
//! repair.

use trellis::{Cardinality, EdgeId, Value, VertexId};
use trellis_driver::backends::MockDriver;

use crate::common;

#[test]
fn rolled_back_vertex_is_not_surfaced() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    session.add_vertex(&["Person"]).expect("add vertex");
    session.tx().rollback().expect("rollback");

    let vertices = session.vertices(&[]).expect("vertices");
    assert!(vertices.is_empty());
    assert_eq!(driver.rollbacks(), 1);
    session.close().expect("close");
}

#[test]
fn rolled_back_property_change_restores_the_previous_value() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "WHERE n.id IN $ids",
        vec![common::vertex_record(5, 500, &["Person"], &[("name", Value::from("Alice"))])],
    );
    let v5 = VertexId::new(5);
    session.vertices(&[v5]).expect("vertices");

    session.set_vertex_property(v5, Cardinality::Single, "name", "Bob").expect("set property");
    let changed = session.vertex_property(v5, "name").expect("property").expect("present");
    assert_eq!(changed.value(), &Value::String("Bob".to_owned()));

    session.tx().rollback().expect("rollback");
    let restored = session.vertex_property(v5, "name").expect("property").expect("present");
    assert_eq!(restored.value(), &Value::String("Alice".to_owned()));
    session.close().expect("close");
}

#[test]
fn rolled_back_new_property_is_absent() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    let v5 = VertexId::new(5);
    session.vertices(&[v5]).expect("vertices");

    session.set_vertex_property(v5, Cardinality::Single, "name", "Bob").expect("set property");
    session.tx().rollback().expect("rollback");
    assert_eq!(session.vertex_property(v5, "name").expect("property"), None);
    session.close().expect("close");
}

#[test]
fn deleted_vertex_reappears_with_adjacency_after_rollback() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "WHERE r.id IN $ids",
        vec![common::edge_record(
            2001,
            "KNOWS",
            (1, 100, &["Person"]),
            (2, 200, &["Person"]),
            &[],
        )],
    );
    let edge = EdgeId::new(2001);
    session.edges(&[edge]).expect("edges");

    let v1 = VertexId::new(1);
    let v2 = VertexId::new(2);
    session.remove_vertex(v1).expect("remove vertex");
    assert!(session.vertex(v1).is_none());
    assert!(session.edge(edge).is_none());

    session.tx().rollback().expect("rollback");

    let restored = session.vertex(v1).expect("vertex restored");
    assert!(restored.out_edges().contains(&edge));
    let other = session.vertex(v2).expect("other endpoint");
    assert!(other.in_edges().contains(&edge));
    let edge_state = session.edge(edge).expect("edge restored");
    assert_eq!(edge_state.source(), v1);
    assert_eq!(edge_state.target(), v2);
    session.close().expect("close");
}

#[test]
fn explicitly_deleted_edge_is_restored_on_rollback() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "WHERE r.id IN $ids",
        vec![common::edge_record(
            2001,
            "KNOWS",
            (1, 100, &["Person"]),
            (2, 200, &["Person"]),
            &[("since", Value::Int(2019))],
        )],
    );
    let edge = EdgeId::new(2001);
    session.edges(&[edge]).expect("edges");

    session.remove_edge(edge).expect("remove edge");
    assert!(!session.vertex(VertexId::new(1)).expect("v1").out_edges().contains(&edge));

    session.tx().rollback().expect("rollback");
    assert!(session.vertex(VertexId::new(1)).expect("v1").out_edges().contains(&edge));
    let restored = session.edge(edge).expect("edge");
    assert_eq!(restored.property("since"), Some(&Value::Int(2019)));
    session.close().expect("close");
}

#[test]
fn rollback_resets_loaded_flags_when_updates_were_pending() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    let v5 = VertexId::new(5);
    session.vertices(&[v5]).expect("vertices");

    // latch the loaded flag with an unfiltered fetch
    session.vertices(&[]).expect("vertices");
    let before = driver.statements().len();
    session.vertices(&[]).expect("vertices");
    assert_eq!(driver.statements().len(), before, "loaded flag must answer from memory");

    // a pending update forces a reload after rollback
    session.set_vertex_property(v5, Cardinality::Single, "name", "Bob").expect("set property");
    session.tx().rollback().expect("rollback");

    session.vertices(&[]).expect("vertices");
    let texts = driver.statement_texts();
    assert!(
        texts.last().is_some_and(|text| text == "MATCH (n) RETURN n"),
        "rollback must reset the loaded flag, got {texts:?}"
    );
    session.close().expect("close");
}

#[test]
fn rolled_back_transient_edge_disappears_from_adjacency() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    let v5 = VertexId::new(5);
    session.vertices(&[v5]).expect("vertices");

    let created = session.add_vertex(&["Person"]).expect("add vertex");
    let edge = session.add_edge("KNOWS", v5, created).expect("add edge");
    assert!(session.vertex(v5).expect("v5").out_edges().contains(&edge));

    session.tx().rollback().expect("rollback");
    assert!(session.vertex(v5).expect("v5").out_edges().is_empty());
    assert!(session.vertex(created).is_none());
    assert!(session.edge(edge).is_none());
    session.close().expect("close");
}

//! Property semantics: cardinalities, accessors, and validation.

use trellis::{Cardinality, Error, Value};
use trellis_driver::backends::MockDriver;

use crate::common;

#[test]
fn list_cardinality_preserves_insertion_order_across_commit() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    session.set_vertex_property(vertex, Cardinality::List, "tag", "x").expect("set");
    session.set_vertex_property(vertex, Cardinality::List, "tag", "y").expect("set");
    session.tx().commit().expect("commit");

    let values: Vec<Value> = session
        .vertex_properties(vertex, &["tag"])
        .expect("properties")
        .iter()
        .map(|p| p.value().clone())
        .collect();
    assert_eq!(values, vec![Value::String("x".to_owned()), Value::String("y".to_owned())]);

    // the insert statement shipped the list in order
    let statements = driver.statements();
    let vp = statements[0].parameter("vp").and_then(Value::as_map).expect("vp");
    assert_eq!(
        vp.get("tag"),
        Some(&Value::List(vec![Value::String("x".to_owned()), Value::String("y".to_owned())]))
    );
    session.close().expect("close");
}

#[test]
fn single_accessor_fails_on_multi_valued_keys() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    session.set_vertex_property(vertex, Cardinality::List, "tag", "x").expect("set");
    session.set_vertex_property(vertex, Cardinality::List, "tag", "y").expect("set");

    let error = session.vertex_property(vertex, "tag").expect_err("multiple");
    assert!(matches!(error, Error::MultipleProperties(_)));
    session.close().expect("close");
}

#[test]
fn cardinality_conflicts_are_rejected() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    session.set_vertex_property(vertex, Cardinality::Single, "tag", "x").expect("set");
    let error = session
        .set_vertex_property(vertex, Cardinality::Set, "tag", "y")
        .expect_err("conflict");
    assert!(matches!(error, Error::CardinalityConflict { .. }));
    session.close().expect("close");
}

#[test]
fn id_field_keys_are_rejected_as_user_supplied_ids() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    let error = session
        .set_vertex_property(vertex, Cardinality::Single, "id", 99i64)
        .expect_err("user supplied id");
    assert!(matches!(error, Error::UserSuppliedId(_)));
    assert!(error.is_user_input());
    session.close().expect("close");
}

#[test]
fn null_and_map_values_are_rejected() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    let error = session
        .set_vertex_property(vertex, Cardinality::Single, "name", Value::Null)
        .expect_err("null");
    assert!(matches!(error, Error::InvalidProperty { .. }));

    let error = session
        .set_vertex_property(
            vertex,
            Cardinality::Single,
            "name",
            Value::Map(std::collections::HashMap::new()),
        )
        .expect_err("map");
    assert!(matches!(error, Error::InvalidProperty { .. }));
    session.close().expect("close");
}

#[test]
fn removing_a_property_value_by_id() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    let first = session.set_vertex_property(vertex, Cardinality::List, "tag", "x").expect("set");
    let second = session.set_vertex_property(vertex, Cardinality::List, "tag", "y").expect("set");
    assert_ne!(first, second);

    assert!(session.remove_vertex_property(vertex, first).expect("remove"));
    let remaining = session.vertex_properties(vertex, &["tag"]).expect("properties");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].value(), &Value::String("y".to_owned()));

    assert!(!session.remove_vertex_property(vertex, first).expect("second remove"));
    session.close().expect("close");
}

#[test]
fn set_cardinality_adds_are_kept_distinct_by_property_id() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let vertex = session.add_vertex(&["Post"]).expect("add vertex");
    session.set_vertex_property(vertex, Cardinality::Set, "tag", "x").expect("set");
    session.set_vertex_property(vertex, Cardinality::Set, "tag", "x").expect("set");

    // each call allocated a fresh property id, so both triples are distinct
    let values = session.vertex_properties(vertex, &["tag"]).expect("properties");
    assert_eq!(values.len(), 2);
    assert_eq!(
        session.vertex(vertex).expect("vertex").cardinality("tag"),
        Some(Cardinality::Set)
    );
    session.close().expect("close");
}

#[test]
fn edge_properties_replace_and_remove() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let v1 = session.add_vertex(&["Person"]).expect("v1");
    let v2 = session.add_vertex(&["Person"]).expect("v2");
    let edge = session.add_edge("KNOWS", v1, v2).expect("edge");

    session.set_edge_property(edge, "since", 2019i64).expect("set");
    session.set_edge_property(edge, "since", 2020i64).expect("replace");
    assert_eq!(session.edge_property(edge, "since").expect("property"), Some(&Value::Int(2020)));

    assert!(session.remove_edge_property(edge, "since").expect("remove"));
    assert_eq!(session.edge_property(edge, "since").expect("property"), None);
    assert!(!session.remove_edge_property(edge, "since").expect("second remove"));
    session.close().expect("close");
}

#[test]
fn list_valued_rows_load_as_list_cardinality() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "WHERE n.id IN $ids",
        vec![common::vertex_record(
            5,
            500,
            &["Post"],
            &[(
                "tag",
                Value::List(vec![Value::String("x".to_owned()), Value::String("y".to_owned())]),
            )],
        )],
    );
    let v5 = trellis::VertexId::new(5);
    session.vertices(&[v5]).expect("vertices");

    let vertex = session.vertex(v5).expect("vertex");
    assert_eq!(vertex.cardinality("tag"), Some(Cardinality::List));
    assert_eq!(vertex.properties(&["tag"]).len(), 2);
    session.close().expect("close");
}

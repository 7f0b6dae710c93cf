//! Reads: blending the working set with streamed back-end rows.

use trellis::{Value, VertexId};
use trellis_driver::backends::MockDriver;

use crate::common;

#[test]
fn fetch_by_ids_only_queries_missing_vertices() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    // materialize vertex 5
    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    session.vertices(&[VertexId::new(5)]).expect("vertices");

    // fetching 5 and 6 only asks the server for 6
    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(6, 600, &["Person"], &[])]);
    let found = session.vertices(&[VertexId::new(5), VertexId::new(6)]).expect("vertices");
    assert_eq!(found, vec![VertexId::new(5), VertexId::new(6)]);

    let last = driver.statements().last().cloned().expect("statement");
    assert_eq!(last.parameter("ids"), Some(&Value::List(vec![Value::Int(6)])));
    session.close().expect("close");
}

#[test]
fn fetch_by_resident_ids_issues_no_statement() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    session.vertices(&[VertexId::new(5)]).expect("vertices");
    let before = driver.statements().len();

    let found = session.vertices(&[VertexId::new(5)]).expect("vertices");
    assert_eq!(found, vec![VertexId::new(5)]);
    assert_eq!(driver.statements().len(), before);
    session.close().expect("close");
}

#[test]
fn fetch_all_unions_transient_vertices_and_latches() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let created = session.add_vertex(&["Person"]).expect("add vertex");
    driver.respond("MATCH (n) RETURN n", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    let found = session.vertices(&[]).expect("vertices");
    assert_eq!(found, vec![created, VertexId::new(5)]);

    // latched: a second unfiltered fetch answers from memory
    let before = driver.statements().len();
    let mut again = session.vertices(&[]).expect("vertices");
    again.sort_unstable();
    assert_eq!(again, vec![created, VertexId::new(5)]);
    assert_eq!(driver.statements().len(), before);
    session.close().expect("close");
}

#[test]
fn deleted_vertices_are_filtered_from_streamed_rows() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond("WHERE n.id IN $ids", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    session.vertices(&[VertexId::new(5)]).expect("vertices");
    session.remove_vertex(VertexId::new(5)).expect("remove");

    // the server still returns the row; the session must not surface it
    driver.respond("MATCH (n) RETURN n", vec![common::vertex_record(5, 500, &["Person"], &[])]);
    let found = session.vertices(&[]).expect("vertices");
    assert!(found.is_empty());
    session.close().expect("close");
}

#[test]
fn resident_vertices_win_over_streamed_rows() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "WHERE n.id IN $ids",
        vec![common::vertex_record(5, 500, &["Person"], &[("name", Value::from("Alice"))])],
    );
    session.vertices(&[VertexId::new(5)]).expect("vertices");
    session
        .set_vertex_property(VertexId::new(5), trellis::Cardinality::Single, "name", "Bob")
        .expect("set property");

    // a re-read of the same vertex must not clobber local modifications
    driver.respond(
        "MATCH (n) RETURN n",
        vec![common::vertex_record(5, 500, &["Person"], &[("name", Value::from("Alice"))])],
    );
    let found = session.vertices(&[]).expect("vertices");
    assert_eq!(found, vec![VertexId::new(5)]);
    let name = session
        .vertex_property(VertexId::new(5), "name")
        .expect("property")
        .expect("present");
    assert_eq!(name.value(), &Value::String("Bob".to_owned()));
    session.close().expect("close");
}

#[test]
fn fetch_all_edges_unions_transients_and_latches() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    let v1 = session.add_vertex(&["Person"]).expect("v1");
    let v2 = session.add_vertex(&["Person"]).expect("v2");
    let created = session.add_edge("KNOWS", v1, v2).expect("edge");

    driver.respond(
        "MATCH (n)-[r]->(m) RETURN n, r, m",
        vec![common::edge_record(2001, "REL", (5, 500, &["Person"]), (6, 600, &["Person"]), &[])],
    );
    let found = session.edges(&[]).expect("edges");
    assert_eq!(found, vec![created, trellis::EdgeId::new(2001)]);

    let before = driver.statements().len();
    session.edges(&[]).expect("edges");
    assert_eq!(driver.statements().len(), before);
    session.close().expect("close");
}

#[test]
fn streamed_edges_materialize_their_endpoints() {
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
    let found = session.edges(&[trellis::EdgeId::new(2001)]).expect("edges");
    assert_eq!(found.len(), 1);

    let v1 = session.vertex(VertexId::new(1)).expect("out endpoint");
    assert!(v1.out_edges().contains(&trellis::EdgeId::new(2001)));
    let v2 = session.vertex(VertexId::new(2)).expect("in endpoint");
    assert!(v2.in_edges().contains(&trellis::EdgeId::new(2001)));
    session.close().expect("close");
}

#[test]
fn arbitrary_statements_stream_through_the_working_set() {
    use trellis_driver::Statement;

    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    driver.respond(
        "n.name = $name",
        vec![common::vertex_record(5, 500, &["Person"], &[("name", Value::from("Alice"))])],
    );
    let statement = Statement::new("MATCH (n:`Person`) WHERE n.name = $name RETURN n")
        .with_parameter("name", "Alice");
    let found = session.vertices_by_statement(&statement).expect("vertices");
    assert_eq!(found, vec![VertexId::new(5)]);

    // the same row re-queried resolves to the resident vertex
    session.remove_vertex(VertexId::new(5)).expect("remove");
    driver.respond(
        "n.name = $name",
        vec![common::vertex_record(5, 500, &["Person"], &[("name", Value::from("Alice"))])],
    );
    let found = session.vertices_by_statement(&statement).expect("vertices");
    assert!(found.is_empty(), "deleted vertices stay hidden from raw queries");

    driver.respond(
        "r.since > $since",
        vec![common::edge_record(
            2001,
            "KNOWS",
            (7, 700, &["Person"]),
            (8, 800, &["Person"]),
            &[("since", Value::Int(2020))],
        )],
    );
    let statement = Statement::new(
        "MATCH (n:`Person`)-[r:`KNOWS`]->(m:`Person`) WHERE r.since > $since RETURN n, r, m",
    )
    .with_parameter("since", 2019i64);
    let edges = session.edges_by_statement(&statement).expect("edges");
    assert_eq!(edges, vec![trellis::EdgeId::new(2001)]);
    session.close().expect("close");
}

#[test]
fn reversed_relationship_orientation_is_respected() {
    let driver = MockDriver::new();
    let mut session = common::session(&driver);

    // the relationship runs m -> n: start node is the second column's native id
    let record = {
        use trellis_driver::{Node, Record, RecordValue, Relationship};
        let n = Node::new(100, vec!["Person".to_owned()]).with_property("id", 1i64);
        let m = Node::new(200, vec!["Person".to_owned()]).with_property("id", 2i64);
        let r = Relationship::new(2001, 200, 100, "KNOWS").with_property("id", 2001i64);
        Record::new(vec![RecordValue::Node(n), RecordValue::Relationship(r), RecordValue::Node(m)])
    };
    driver.respond("WHERE r.id IN $ids", vec![record]);
    session.edges(&[trellis::EdgeId::new(2001)]).expect("edges");

    let edge = session.edge(trellis::EdgeId::new(2001)).expect("edge");
    assert_eq!(edge.source(), VertexId::new(2));
    assert_eq!(edge.target(), VertexId::new(1));
    session.close().expect("close");
}

use super::create_store;
use crate::{example_quad, example_quad_in_graph};
use futures::TryStreamExt;
use rdf_weave_common::{ExecutionContext, StoreCapabilities, TripleStore};
use rdf_weave_model::{
    Bgp, GraphName, NamedNode, NamedNodePattern, Quad, TermPattern, TriplePattern, Variable,
};
use rdf_weave_storage::MemTripleStore;

fn any_triple() -> TriplePattern {
    TriplePattern {
        subject: TermPattern::Variable(Variable::new_unchecked("s")),
        predicate: NamedNodePattern::Variable(Variable::new_unchecked("p")),
        object: TermPattern::Variable(Variable::new_unchecked("o")),
    }
}

#[test]
fn insert_quad() {
    let store = create_store();

    assert!(store.insert(example_quad()));
    assert_eq!(store.len(), 1);
}

#[test]
fn insert_duplicate_quads_no_effect() {
    let store = create_store();

    store.insert(example_quad());

    assert!(!store.insert(example_quad()));
    assert_eq!(store.len(), 1);
}

#[test]
fn extend_with_duplicates_in_same_operation() {
    let store = create_store();

    let inserted = store.extend(vec![
        example_quad(),
        example_quad(),
        example_quad_in_graph("http://example.com/graph"),
    ]);

    assert_eq!(inserted, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn clear_removes_everything() {
    let store = create_store();
    store.extend(vec![
        example_quad(),
        example_quad_in_graph("http://example.com/graph"),
    ]);

    store.clear();

    assert!(store.is_empty());
}

#[tokio::test]
async fn insert_quad_then_find() {
    let store = create_store();
    store.insert(example_quad());

    let triples = store
        .find(&any_triple(), &GraphName::DefaultGraph, &ExecutionContext::new())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    assert_eq!(triples.len(), 1);
    insta::assert_snapshot!(
        triples[0],
        @r#"<http://example.com/subject> <http://example.com/predicate> "value""#
    );
}

#[tokio::test]
async fn find_in_named_graph() {
    let store = create_store();
    store.extend(vec![
        example_quad(),
        example_quad_in_graph("http://example.com/graph"),
        example_quad_in_graph("http://example.com/other"),
    ]);
    let graph = GraphName::NamedNode(NamedNode::new_unchecked("http://example.com/graph"));

    let triples = store
        .find(&any_triple(), &graph, &ExecutionContext::new())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    assert_eq!(triples.len(), 1);
    assert_eq!(store.statistics().find_requests, 1);
}

#[tokio::test]
async fn union_concatenates_bgp_results() {
    let store = create_store();
    let knows = NamedNode::new_unchecked("http://example.com/knows");
    for (subject, object) in [("a", "b"), ("b", "c"), ("c", "a")] {
        store.insert(Quad::new(
            NamedNode::new_unchecked(format!("http://example.com/{subject}")),
            knows.clone(),
            NamedNode::new_unchecked(format!("http://example.com/{object}")),
            GraphName::DefaultGraph,
        ));
    }
    let from = |subject: &str, variable: &str| {
        Bgp::in_default_graph(vec![TriplePattern {
            subject: NamedNode::new_unchecked(format!("http://example.com/{subject}")).into(),
            predicate: knows.clone().into(),
            object: Variable::new_unchecked(variable).into(),
        }])
    };

    let solutions = store
        .eval_union(&[from("a", "o_0"), from("b", "o_1")], &ExecutionContext::new())
        .unwrap()
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    insta::assert_snapshot!(
        solutions.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"),
        @r"
    {?o_0 -> <http://example.com/b>}
    {?o_1 -> <http://example.com/c>}
    "
    );
    assert_eq!(store.statistics().union_requests, 1);
}

#[tokio::test]
async fn basic_store_rejects_unions() {
    let store = MemTripleStore::with_capabilities(StoreCapabilities::basic());

    let Err(error) = store.eval_union(&[], &ExecutionContext::new()) else {
        panic!("union evaluation on a basic store");
    };

    assert_eq!(error.to_string(), "The store does not support union evaluation");
    assert_eq!(store.statistics().union_requests, 0);
}

#![cfg(test)]

use rdf_weave::common::{
    BgpEvaluator, ContextProperties, ExecutionContext, StoreCapabilities, TripleStore,
};
use rdf_weave::engine::DefaultBgpEvaluator;
use rdf_weave::model::{
    Bgp, Binding, GraphName, Literal, NamedNode, Quad, Term, TriplePattern, Variable,
};
use rdf_weave::physical::{bound_join, hash_join, index_join, sym_hash_join};
use rdf_weave::stage::{EagerEngine, StageEngine, StreamingEngine};
use rdf_weave::storage::MemTripleStore;
use std::sync::Arc;

const PEOPLE: usize = 20;

fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{value}"))
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn person(i: usize) -> NamedNode {
    iri(&format!("p{i}"))
}

/// Every person knows the next one and has an age.
fn store(capabilities: StoreCapabilities) -> Arc<MemTripleStore> {
    let store = MemTripleStore::with_capabilities(capabilities);
    for i in 0..PEOPLE {
        store.insert(Quad::new(
            person(i),
            iri("knows"),
            person((i + 1) % PEOPLE),
            GraphName::DefaultGraph,
        ));
        store.insert(Quad::new(
            person(i),
            iri("age"),
            Literal::from(i64::try_from(i).unwrap_or_default()),
            GraphName::DefaultGraph,
        ));
    }
    Arc::new(store)
}

fn knows() -> TriplePattern {
    TriplePattern {
        subject: var("s").into(),
        predicate: iri("knows").into(),
        object: var("o").into(),
    }
}

fn age() -> TriplePattern {
    TriplePattern {
        subject: var("o").into(),
        predicate: iri("age").into(),
        object: var("a").into(),
    }
}

fn seeds() -> Vec<Binding> {
    (0..PEOPLE)
        .map(|i| [(var("s"), Term::from(person(i)))].into_iter().collect())
        .collect()
}

async fn sorted<E: StageEngine>(engine: &E, stage: E::Stage<Binding>) -> Vec<String> {
    let mut result = engine
        .to_vec(stage)
        .await
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    result.sort();
    result
}

async fn check_hash_joins<E: StageEngine>(engine: E) {
    let mem = store(StoreCapabilities::basic());
    let store: Arc<dyn TripleStore> = mem;
    let context = ExecutionContext::new();
    let graph = GraphName::DefaultGraph;
    let scan = |pattern: TriplePattern| {
        index_join(
            &engine,
            engine.of(vec![Binding::new()]),
            &pattern,
            &graph,
            &store,
            &context,
        )
    };

    let hashed = sorted(&engine, hash_join(&engine, scan(knows()), scan(age()), var("o"))).await;
    let symmetric = sorted(
        &engine,
        sym_hash_join(&engine, var("o"), scan(knows()), scan(age())),
    )
    .await;
    let chained = sorted(
        &engine,
        index_join(&engine, scan(knows()), &age(), &graph, &store, &context),
    )
    .await;

    assert_eq!(hashed.len(), PEOPLE);
    assert_eq!(hashed, symmetric);
    assert_eq!(hashed, chained);
}

async fn check_bucket_size_invariance<E: StageEngine>(engine: E) {
    let bgp = Bgp::in_default_graph(vec![knows(), age()]);
    let reference = {
        let store: Arc<dyn TripleStore> = store(StoreCapabilities::basic());
        let evaluator = DefaultBgpEvaluator::new(store);
        let stage = evaluator.evaluate(
            &engine,
            engine.of(seeds()),
            &bgp,
            &ExecutionContext::new(),
        );
        sorted(&engine, stage).await
    };

    for bucket_size in [1, 15] {
        let mem = store(StoreCapabilities::all());
        let store: Arc<dyn TripleStore> = mem.clone();
        let evaluator = DefaultBgpEvaluator::new(store);
        let context = ExecutionContext::new().with_properties(
            ContextProperties::default().with_bound_join_bucket_size(bucket_size),
        );

        let stage = evaluator.evaluate(&engine, engine.of(seeds()), &bgp, &context);
        let result = sorted(&engine, stage).await;

        assert_eq!(result.len(), PEOPLE);
        assert_eq!(result, reference);
        assert_eq!(
            mem.statistics().union_requests,
            PEOPLE.div_ceil(bucket_size)
        );
    }
}

async fn check_missing_capability<E: StageEngine>(engine: E) {
    let basic: Arc<dyn TripleStore> = store(StoreCapabilities::basic());
    let evaluator: Arc<dyn BgpEvaluator<E>> = Arc::new(DefaultBgpEvaluator::new(basic.clone()));

    let result = bound_join(
        &engine,
        engine.of(seeds()),
        &Bgp::in_default_graph(vec![knows()]),
        &basic,
        &evaluator,
        &ExecutionContext::new(),
    );

    let Err(error) = result else {
        panic!("bound join accepted a store without union evaluation");
    };
    insta::allow_duplicates! {
        insta::assert_snapshot!(error, @"bound join requires a store that supports union evaluation");
    }
}

async fn check_limit<E: StageEngine>(engine: E) {
    let store: Arc<dyn TripleStore> = store(StoreCapabilities::all());
    let evaluator = DefaultBgpEvaluator::new(store);
    let bgp = Bgp::in_default_graph(vec![knows(), age()]);

    let stage = evaluator.evaluate(&engine, engine.of(seeds()), &bgp, &ExecutionContext::new());
    let result = engine.to_vec(engine.limit(stage, 3)).await.unwrap();

    assert_eq!(result.len(), 3);
}

#[tokio::test]
async fn hash_symmetric_and_index_joins_agree() {
    check_hash_joins(EagerEngine).await;
    check_hash_joins(StreamingEngine).await;
}

#[tokio::test]
async fn bound_join_is_independent_of_bucket_size() {
    check_bucket_size_invariance(EagerEngine).await;
    check_bucket_size_invariance(StreamingEngine).await;
}

#[tokio::test]
async fn bound_join_requires_union_evaluation() {
    check_missing_capability(EagerEngine).await;
    check_missing_capability(StreamingEngine).await;
}

#[tokio::test]
async fn limit_applies_to_evaluated_bgps() {
    check_limit(EagerEngine).await;
    check_limit(StreamingEngine).await;
}

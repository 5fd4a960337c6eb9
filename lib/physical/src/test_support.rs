use crate::index_join;
use rdf_weave_common::{BgpEvaluator, ExecutionContext, StoreCapabilities, TripleStore};
use rdf_weave_model::{
    Bgp, Binding, GraphName, Literal, NamedNode, Quad, Term, TriplePattern, Variable,
};
use rdf_weave_stage::StageEngine;
use rdf_weave_storage::MemTripleStore;
use std::sync::Arc;

/// Chains index joins over the patterns in their given order.
#[derive(Debug)]
pub(crate) struct ChainEvaluator {
    pub(crate) store: Arc<dyn TripleStore>,
}

impl<E: StageEngine> BgpEvaluator<E> for ChainEvaluator {
    fn evaluate(
        &self,
        engine: &E,
        source: E::Stage<Binding>,
        bgp: &Bgp,
        context: &ExecutionContext,
    ) -> E::Stage<Binding> {
        bgp.patterns().iter().fold(source, |stage, pattern| {
            index_join(engine, stage, pattern, bgp.graph(), &self.store, context)
        })
    }
}

pub(crate) fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{value}"))
}

pub(crate) fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub(crate) fn person(i: usize) -> Term {
    Term::from(iri(&format!("p{i}")))
}

/// Ten people, each knowing the next two people, and each having an age.
pub(crate) fn people(capabilities: StoreCapabilities) -> Arc<MemTripleStore> {
    let store = MemTripleStore::with_capabilities(capabilities);
    for i in 0..10 {
        let subject = iri(&format!("p{i}"));
        for offset in [1, 2] {
            store.insert(Quad::new(
                subject.clone(),
                iri("knows"),
                iri(&format!("p{}", (i + offset) % 10)),
                GraphName::DefaultGraph,
            ));
        }
        store.insert(Quad::new(
            subject,
            iri("age"),
            Literal::from(i64::try_from(20 + i).unwrap_or_default()),
            GraphName::DefaultGraph,
        ));
    }
    Arc::new(store)
}

/// `?s <knows> ?o . ?o <age> ?a`
pub(crate) fn knows_age() -> Bgp {
    Bgp::in_default_graph(vec![
        TriplePattern {
            subject: var("s").into(),
            predicate: iri("knows").into(),
            object: var("o").into(),
        },
        TriplePattern {
            subject: var("o").into(),
            predicate: iri("age").into(),
            object: var("a").into(),
        },
    ])
}

pub(crate) async fn sorted<E: StageEngine>(engine: &E, stage: E::Stage<Binding>) -> Vec<String> {
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

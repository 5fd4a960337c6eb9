use rdf_weave_common::{ExecutionContext, TripleStore};
use rdf_weave_model::{bind_pattern, match_triple, Binding, GraphName, TriplePattern};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;

/// Joins every binding of `source` with the triples of `graph` that match `pattern`.
///
/// For each binding, the variables it binds are substituted into `pattern` and the resulting
/// pattern is looked up in `store`. Each matching triple contributes the union of the binding
/// with the variables bound by the triple.
pub fn index_join<E: StageEngine>(
    engine: &E,
    source: E::Stage<Binding>,
    pattern: &TriplePattern,
    graph: &GraphName,
    store: &Arc<dyn TripleStore>,
    context: &ExecutionContext,
) -> E::Stage<Binding> {
    let inner = engine.clone();
    let pattern = pattern.clone();
    let graph = graph.clone();
    let store = Arc::clone(store);
    let context = context.clone();

    engine.merge_map(source, move |binding| {
        let Some(lookup) = bind_pattern(&pattern, &binding) else {
            return inner.empty();
        };

        let triples = inner.from_stream(store.find(&lookup, &graph, &context));
        inner.flat_map(triples, move |triple| {
            match_triple(&lookup, &triple)
                .map(|matched| binding.union(&matched))
                .into_iter()
                .collect()
        })
    })
}

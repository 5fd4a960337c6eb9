use crate::{estimate_pattern_cardinality, order_patterns};
use rdf_weave_common::{BgpEvaluator, Capability, ExecutionContext, TripleStore};
use rdf_weave_model::{Bgp, Binding, GraphName, TriplePattern};
use rdf_weave_physical::{bound_join, index_join};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;

/// The [BgpEvaluator] used by RDF Weave.
///
/// - If the store supports [Capability::UnionEvaluation] and the context does not force index
///   joins, the BGP is evaluated with a [bound_join].
/// - Otherwise, the patterns are ordered by their estimated cardinality and joined with a
///   left-linear chain of [index_join]s. Estimates come from the store if it supports
///   [Capability::CardinalityEstimation] and from [estimate_pattern_cardinality] otherwise.
#[derive(Clone, Debug)]
pub struct DefaultBgpEvaluator {
    store: Arc<dyn TripleStore>,
}

impl DefaultBgpEvaluator {
    /// Creates a new [DefaultBgpEvaluator] that evaluates BGPs against `store`.
    pub fn new(store: Arc<dyn TripleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TripleStore> {
        &self.store
    }

    /// Returns the solutions of `bgp` on its own, i.e., joined with the empty binding.
    pub fn evaluate_bgp<E: StageEngine>(
        &self,
        engine: &E,
        bgp: &Bgp,
        context: &ExecutionContext,
    ) -> E::Stage<Binding> {
        self.evaluate(engine, engine.of(vec![Binding::new()]), bgp, context)
    }

    fn index_join_chain<E: StageEngine>(
        &self,
        engine: &E,
        source: E::Stage<Binding>,
        bgp: &Bgp,
        context: &ExecutionContext,
    ) -> E::Stage<Binding> {
        if !self
            .store
            .capabilities()
            .supports(Capability::CardinalityEstimation)
        {
            let costs = bgp
                .patterns()
                .iter()
                .map(estimate_pattern_cardinality)
                .collect::<Vec<_>>();
            let ordered = order_patterns(bgp.patterns(), &costs);
            return chain(engine, source, &ordered, bgp.graph(), &self.store, context);
        }

        let store = Arc::clone(&self.store);
        let patterns = bgp.patterns().to_vec();
        let graph = bgp.graph().clone();
        let ordering = engine.from_future(async move {
            let mut costs = Vec::with_capacity(patterns.len());
            for pattern in &patterns {
                let cost = match store.estimate_cardinality(pattern, &graph).await {
                    Ok(cost) => cost,
                    Err(error) => {
                        tracing::warn!(%pattern, %error, "Falling back to heuristic cardinality");
                        estimate_pattern_cardinality(pattern)
                    }
                };
                costs.push(cost);
            }
            Ok(order_patterns(&patterns, &costs))
        });

        let inner = engine.clone();
        let store = Arc::clone(&self.store);
        let graph = bgp.graph().clone();
        let context = context.clone();
        let mut source = Some(source);
        engine.merge_map(ordering, move |ordered| match source.take() {
            Some(source) => chain(&inner, source, &ordered, &graph, &store, &context),
            None => inner.empty(),
        })
    }
}

impl<E: StageEngine> BgpEvaluator<E> for DefaultBgpEvaluator {
    fn evaluate(
        &self,
        engine: &E,
        source: E::Stage<Binding>,
        bgp: &Bgp,
        context: &ExecutionContext,
    ) -> E::Stage<Binding> {
        if bgp.is_empty() {
            return source;
        }

        let supports_union = self
            .store
            .capabilities()
            .supports(Capability::UnionEvaluation);
        if supports_union && !context.properties().force_index_join {
            tracing::debug!(bgp = %bgp, "Evaluating BGP with bound join");
            let evaluator: Arc<dyn BgpEvaluator<E>> = Arc::new(self.clone());
            return match bound_join(engine, source, bgp, &self.store, &evaluator, context) {
                Ok(stage) => stage,
                Err(error) => engine.fail(error.into()),
            };
        }

        tracing::debug!(bgp = %bgp, "Evaluating BGP with index joins");
        self.index_join_chain(engine, source, bgp, context)
    }
}

fn chain<E: StageEngine>(
    engine: &E,
    source: E::Stage<Binding>,
    patterns: &[TriplePattern],
    graph: &GraphName,
    store: &Arc<dyn TripleStore>,
    context: &ExecutionContext,
) -> E::Stage<Binding> {
    patterns.iter().fold(source, |stage, pattern| {
        index_join(engine, stage, pattern, graph, store, context)
    })
}

use rdf_weave_cache::WriterId;
use rdf_weave_common::{BgpEvaluator, ExecutionContext, TripleStore};
use rdf_weave_model::{Bgp, Binding};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;

/// Evaluates `bgp` and reuses (or populates) the cache of `context`.
///
/// - Without a cache, or for queries with `LIMIT`/`OFFSET`, `bgp` is evaluated by the store.
/// - If no part of `bgp` is cached, the store's solutions are written to the cache while they
///   are passed on.
/// - If `bgp` is cached, the cached solutions are returned. Should the entry vanish before it is
///   committed, `bgp` is evaluated by the store instead.
/// - If only a subset of the patterns is cached, the missing patterns are joined with the cached
///   solutions by `evaluator` (forcing index joins). The combined solutions are cached for `bgp`.
pub fn evaluate_cached_bgp<E: StageEngine>(
    engine: &E,
    bgp: &Bgp,
    store: &Arc<dyn TripleStore>,
    evaluator: &dyn BgpEvaluator<E>,
    context: &ExecutionContext,
) -> E::Stage<Binding> {
    let cache = context
        .cache()
        .filter(|_| !context.properties().has_limit_or_offset);
    let Some(cache) = cache else {
        return engine.from_stream(store.eval_bgp(bgp, context));
    };

    let found = cache.find_subset(bgp);
    if found.is_miss() {
        tracing::debug!(bgp = %bgp, "BGP cache miss");
        let solutions = store.eval_bgp(bgp, context);
        return engine.from_stream(cache.tee(bgp.clone(), WriterId::random(), solutions));
    }

    if found.is_exact() {
        tracing::debug!(bgp = %bgp, "BGP cache hit");
        return cache.get_as_stage(engine, bgp, direct_evaluation(engine, bgp, store, context));
    }

    tracing::debug!(
        bgp = %bgp,
        cached = found.subset.len(),
        missing = found.missing.len(),
        "Partial BGP cache hit"
    );
    let subset = bgp.with_patterns(found.subset);
    let missing = bgp.with_patterns(found.missing);
    let cached = cache.get_as_stage(
        engine,
        &subset,
        direct_evaluation(engine, &subset, store, context),
    );

    let forced = context.map_properties(|properties| properties.with_force_index_join(true));
    let joined = evaluator.evaluate(engine, cached, &missing, &forced);
    engine.from_stream(cache.tee(
        bgp.clone(),
        WriterId::random(),
        engine.into_stream(joined),
    ))
}

fn direct_evaluation<E: StageEngine>(
    engine: &E,
    bgp: &Bgp,
    store: &Arc<dyn TripleStore>,
    context: &ExecutionContext,
) -> impl FnOnce() -> E::Stage<Binding> + Send + 'static {
    let engine = engine.clone();
    let bgp = bgp.clone();
    let store = Arc::clone(store);
    let context = context.clone();
    move || engine.from_stream(store.eval_bgp(&bgp, &context))
}

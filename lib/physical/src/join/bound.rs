use crate::join::RewritingTable;
use crate::{evaluate_cached_bgp, JoinError};
use rdf_weave_cache::WriterId;
use rdf_weave_common::{BgpEvaluator, Capability, ExecutionContext, TripleStore};
use rdf_weave_model::{bind_pattern, is_ground_pattern, Bgp, Binding};
use rdf_weave_stage::StageEngine;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Joins every binding of `source` with the solutions of `bgp` by sending buckets of bindings
/// as a single union request to the store.
///
/// The bindings are grouped into buckets of
/// [bucket_size](rdf_weave_common::ContextProperties::bucket_size) bindings. For every bucket:
///
/// - A bucket that only holds the empty binding evaluates `bgp` as is, using the cache of
///   `context` if there is one.
/// - Bindings that turn `bgp` into a BGP without variables are evaluated by `evaluator` with
///   [force_index_join](rdf_weave_common::ContextProperties::force_index_join) set.
/// - All other bindings are substituted into `bgp`, the remaining variables are renamed with the
///   position of the binding in the bucket, and the rewritten BGPs are evaluated with
///   [TripleStore::eval_union]. Results are mapped back to their binding by a [RewritingTable].
///
/// The result multiset does not depend on the bucket size. No ordering is guaranteed.
///
/// # Errors
///
/// Returns [JoinError::MissingCapability] if `store` does not support union evaluation.
pub fn bound_join<E: StageEngine>(
    engine: &E,
    source: E::Stage<Binding>,
    bgp: &Bgp,
    store: &Arc<dyn TripleStore>,
    evaluator: &Arc<dyn BgpEvaluator<E>>,
    context: &ExecutionContext,
) -> Result<E::Stage<Binding>, JoinError> {
    if !store.capabilities().supports(Capability::UnionEvaluation) {
        return Err(JoinError::MissingCapability {
            operator: "bound join",
            capability: Capability::UnionEvaluation,
        });
    }

    let bucket_size = context.properties().bucket_size();
    let join = Arc::new(BoundJoin {
        engine: engine.clone(),
        bgp: bgp.clone(),
        store: Arc::clone(store),
        evaluator: Arc::clone(evaluator),
        context: context.clone(),
    });

    let buckets = engine.buffer_count(source, bucket_size);
    Ok(engine.merge_map(buckets, move |bucket| join.evaluate_bucket(bucket)))
}

struct BoundJoin<E: StageEngine> {
    engine: E,
    bgp: Bgp,
    store: Arc<dyn TripleStore>,
    evaluator: Arc<dyn BgpEvaluator<E>>,
    context: ExecutionContext,
}

impl<E: StageEngine> BoundJoin<E> {
    fn evaluate_bucket(&self, bucket: Vec<Binding>) -> E::Stage<Binding> {
        if let [seed] = bucket.as_slice() {
            if seed.is_empty() {
                return evaluate_cached_bgp(
                    &self.engine,
                    &self.bgp,
                    &self.store,
                    self.evaluator.as_ref(),
                    &self.context,
                );
            }
        }

        let mut table = RewritingTable::default();
        let mut direct = Vec::new();
        let mut rewritten = Vec::new();
        for (key, binding) in bucket.into_iter().enumerate() {
            let bound = self
                .bgp
                .patterns()
                .iter()
                .map(|pattern| bind_pattern(pattern, &binding))
                .collect::<Option<Vec<_>>>();
            let Some(bound) = bound else {
                tracing::trace!(%binding, "Dropping binding that can never match");
                continue;
            };

            if bound.iter().all(is_ground_pattern) {
                direct.push(binding);
            } else {
                let bgp = RewritingTable::rewrite_bgp(&self.bgp.with_patterns(bound), key);
                rewritten.push((key, bgp));
                table.insert(key, binding);
            }
        }
        tracing::debug!(
            rewritten = rewritten.len(),
            direct = direct.len(),
            "Dispatching bound join bucket"
        );

        let mut stages = Vec::new();
        if !direct.is_empty() {
            let forced = self
                .context
                .map_properties(|properties| properties.with_force_index_join(true));
            stages.push(self.evaluator.evaluate(
                &self.engine,
                self.engine.of(direct),
                &self.bgp,
                &forced,
            ));
        }
        if !rewritten.is_empty() {
            let table = Arc::new(table);
            let results = self.evaluate_rewritten(rewritten, &table);
            stages.push(self.engine.flat_map(results, move |result| {
                match table.restore(&result) {
                    Some(restored) => vec![restored],
                    None => {
                        tracing::warn!(%result, "Dropping bound join result without rewriting key");
                        Vec::new()
                    }
                }
            }));
        }
        self.engine.merge(stages)
    }

    /// Evaluates the rewritten BGPs. The results still carry the renamed variables.
    fn evaluate_rewritten(
        &self,
        rewritten: Vec<(usize, Bgp)>,
        table: &Arc<RewritingTable>,
    ) -> E::Stage<Binding> {
        let cache = self
            .context
            .cache()
            .filter(|_| !self.context.properties().has_limit_or_offset);
        let (cached, uncached): (Vec<_>, Vec<_>) = match cache {
            Some(cache) => rewritten
                .into_iter()
                .partition(|(_, bgp)| cache.has(bgp)),
            None => (Vec::new(), rewritten),
        };

        let mut stages = Vec::new();
        if let Some(cache) = cache {
            for (_, bgp) in &cached {
                tracing::trace!(bgp = %bgp, "Reading rewritten BGP from the cache");
                let inner = self.engine.clone();
                let store = Arc::clone(&self.store);
                let context = self.context.clone();
                let fallback = bgp.clone();
                stages.push(cache.get_as_stage(&self.engine, bgp, move || {
                    inner.from_stream(store.eval_bgp(&fallback, &context))
                }));
            }
        }

        if !uncached.is_empty() {
            let (keys, bgps): (Vec<_>, Vec<_>) = uncached.into_iter().unzip();
            match self.store.eval_union(&bgps, &self.context) {
                Ok(stream) => {
                    let stream = match cache {
                        Some(cache) => {
                            let positions = keys
                                .iter()
                                .enumerate()
                                .map(|(position, key)| (*key, position))
                                .collect::<FxHashMap<_, _>>();
                            let table = Arc::clone(table);
                            cache.tee_routed(bgps, WriterId::random(), stream, move |result| {
                                table
                                    .recover_key(result)
                                    .and_then(|key| positions.get(&key).copied())
                            })
                        }
                        None => stream,
                    };
                    stages.push(self.engine.from_stream(stream));
                }
                Err(error) => stages.push(self.engine.fail(error.into())),
            }
        }

        self.engine.merge(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{iri, knows_age, people, person, sorted, var, ChainEvaluator};
    use rdf_weave_cache::BgpCache;
    use rdf_weave_common::{ContextProperties, StoreCapabilities};
    use rdf_weave_model::{Literal, Term, TriplePattern};
    use rdf_weave_stage::{EagerEngine, StreamingEngine};
    use rdf_weave_storage::MemTripleStore;

    fn setup<E: StageEngine>(
        capabilities: StoreCapabilities,
    ) -> (
        Arc<rdf_weave_storage::MemTripleStore>,
        Arc<dyn TripleStore>,
        Arc<dyn BgpEvaluator<E>>,
    ) {
        let store = people(capabilities);
        let dyn_store: Arc<dyn TripleStore> = Arc::<MemTripleStore>::clone(&store);
        let evaluator: Arc<dyn BgpEvaluator<E>> = Arc::new(ChainEvaluator {
            store: Arc::clone(&dyn_store),
        });
        (store, dyn_store, evaluator)
    }

    fn subjects(count: usize) -> Vec<Binding> {
        (0..count)
            .map(|i| Binding::new().with(var("s"), person(i % 10)))
            .collect()
    }

    async fn run_with_bucket_size<E: StageEngine>(engine: &E, bucket_size: usize) -> Vec<String> {
        let (_, store, evaluator) = setup::<E>(StoreCapabilities::all());
        let context = ExecutionContext::new().with_properties(
            ContextProperties::default().with_bound_join_bucket_size(bucket_size),
        );

        let joined = bound_join(
            engine,
            engine.of(subjects(20)),
            &knows_age(),
            &store,
            &evaluator,
            &context,
        )
        .unwrap();
        sorted(engine, joined).await
    }

    async fn check_bucket_size_invariance<E: StageEngine>(engine: E) {
        let single = run_with_bucket_size(&engine, 1).await;
        let default = run_with_bucket_size(&engine, 15).await;

        assert_eq!(single.len(), 40);
        assert_eq!(single, default);
    }

    async fn check_seed<E: StageEngine>(engine: E) {
        let (_, store, evaluator) = setup::<E>(StoreCapabilities::all());
        let context = ExecutionContext::new();

        let joined = bound_join(
            &engine,
            engine.of(vec![Binding::new()]),
            &knows_age(),
            &store,
            &evaluator,
            &context,
        )
        .unwrap();
        let direct = engine.from_stream(store.eval_bgp(&knows_age(), &context));

        let joined = sorted(&engine, joined).await;
        assert_eq!(joined.len(), 20);
        assert_eq!(joined, sorted(&engine, direct).await);
    }

    async fn check_ground_bindings_bypass_union<E: StageEngine>(engine: E) {
        let (mem, store, evaluator) = setup::<E>(StoreCapabilities::all());
        let source = vec![
            Binding::new()
                .with(var("s"), person(0))
                .with(var("o"), person(1))
                .with(var("a"), Term::from(Literal::from(21_i64))),
            Binding::new()
                .with(var("s"), person(0))
                .with(var("o"), person(5))
                .with(var("a"), Term::from(Literal::from(25_i64))),
        ];

        let joined = bound_join(
            &engine,
            engine.of(source),
            &knows_age(),
            &store,
            &evaluator,
            &ExecutionContext::new(),
        )
        .unwrap();

        assert_eq!(sorted(&engine, joined).await.len(), 1);
        assert_eq!(mem.statistics().union_requests, 0);
        assert!(mem.statistics().find_requests > 0);
    }

    async fn check_rewritten_bgps_are_cached<E: StageEngine>(engine: E) {
        let (mem, store, evaluator) = setup::<E>(StoreCapabilities::all());
        let cache = Arc::new(BgpCache::default());
        let context = ExecutionContext::new().with_cache(Arc::clone(&cache));

        let first = bound_join(
            &engine,
            engine.of(subjects(3)),
            &knows_age(),
            &store,
            &evaluator,
            &context,
        )
        .unwrap();
        let first = sorted(&engine, first).await;
        assert_eq!(cache.count(), 3);
        assert_eq!(mem.statistics().union_requests, 1);

        let second = bound_join(
            &engine,
            engine.of(subjects(3)),
            &knows_age(),
            &store,
            &evaluator,
            &context,
        )
        .unwrap();
        assert_eq!(sorted(&engine, second).await, first);
        assert_eq!(mem.statistics().union_requests, 1);
    }

    #[tokio::test]
    async fn bucket_size_does_not_change_results() {
        check_bucket_size_invariance(EagerEngine).await;
        check_bucket_size_invariance(StreamingEngine).await;
    }

    #[tokio::test]
    async fn seed_bucket_evaluates_bgp() {
        check_seed(EagerEngine).await;
        check_seed(StreamingEngine).await;
    }

    #[tokio::test]
    async fn ground_bindings_bypass_union() {
        check_ground_bindings_bypass_union(EagerEngine).await;
        check_ground_bindings_bypass_union(StreamingEngine).await;
    }

    #[tokio::test]
    async fn rewritten_bgps_are_cached() {
        check_rewritten_bgps_are_cached(EagerEngine).await;
        check_rewritten_bgps_are_cached(StreamingEngine).await;
    }

    #[test]
    fn missing_union_capability_is_an_error() {
        let engine = EagerEngine;
        let (_, store, evaluator) = setup::<EagerEngine>(StoreCapabilities::basic());

        let result = bound_join(
            &engine,
            engine.of(Vec::new()),
            &knows_age(),
            &store,
            &evaluator,
            &ExecutionContext::new(),
        );

        let Err(error) = result else {
            panic!("bound join must fail without union support");
        };
        insta::assert_snapshot!(error, @"bound join requires a store that supports union evaluation");
    }

    #[tokio::test]
    async fn unmatchable_bindings_are_dropped() {
        let engine = StreamingEngine;
        let (_, store, evaluator) = setup::<StreamingEngine>(StoreCapabilities::all());
        let bgp = Bgp::in_default_graph(vec![TriplePattern {
            subject: var("s").into(),
            predicate: var("p").into(),
            object: var("o").into(),
        }]);
        let source = vec![
            Binding::new().with(var("p"), Term::from(Literal::from(1_i64))),
            Binding::new().with(var("p"), Term::from(iri("age"))),
        ];

        let joined = bound_join(
            &engine,
            engine.of(source),
            &bgp,
            &store,
            &evaluator,
            &ExecutionContext::new(),
        )
        .unwrap();

        assert_eq!(sorted(&engine, joined).await.len(), 10);
    }
}

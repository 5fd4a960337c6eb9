use crate::memory::eval::evaluate_bgp;
use crate::memory::index::QuadIndex;
use crate::memory::statistics::{Request, RequestCounters};
use crate::StoreStatistics;
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use parking_lot::RwLock;
use rdf_weave_common::error::StorageError;
use rdf_weave_common::{Capability, ExecutionContext, StoreCapabilities, TripleStore};
use rdf_weave_model::{Bgp, Binding, GraphName, Quad, Triple, TriplePattern};
use rdf_weave_stage::ValueStream;
use std::fmt::{Debug, Formatter};

/// A memory-based triple store.
///
/// Every request is answered from a consistent view of the quads, taken when the request is
/// issued. Quads inserted afterward are not visible to the returned stream.
pub struct MemTripleStore {
    index: RwLock<QuadIndex>,
    capabilities: StoreCapabilities,
    requests: RequestCounters,
}

impl MemTripleStore {
    /// Creates an empty store that supports all capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(StoreCapabilities::all())
    }

    /// Creates an empty store that only announces `capabilities`.
    ///
    /// [Capability::TriplePatternLookup] and [Capability::BgpEvaluation] are always supported.
    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        let capabilities = capabilities
            .with(Capability::TriplePatternLookup)
            .with(Capability::BgpEvaluation);
        Self {
            index: RwLock::new(QuadIndex::default()),
            capabilities,
            requests: RequestCounters::default(),
        }
    }

    /// Inserts `quad`. Returns `false` if the quad was already present.
    pub fn insert(&self, quad: Quad) -> bool {
        self.index.write().insert(quad)
    }

    /// Inserts all `quads` and returns the number of newly inserted quads.
    pub fn extend(&self, quads: impl IntoIterator<Item = Quad>) -> usize {
        let mut index = self.index.write();
        quads
            .into_iter()
            .filter(|quad| index.insert(quad.clone()))
            .count()
    }

    /// Removes all quads.
    pub fn clear(&self) {
        self.index.write().clear();
    }

    /// Returns the number of quads.
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of requests answered since the store was created or the statistics
    /// were reset.
    pub fn statistics(&self) -> StoreStatistics {
        self.requests.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.requests.reset();
    }
}

impl Default for MemTripleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MemTripleStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTripleStore")
            .field("len", &self.len())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[async_trait]
impl TripleStore for MemTripleStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn find(
        &self,
        pattern: &TriplePattern,
        graph: &GraphName,
        _context: &ExecutionContext,
    ) -> ValueStream<Triple> {
        self.requests.record(Request::Find);
        let triples = self.index.read().scan(pattern, graph);
        tracing::trace!(%pattern, matches = triples.len(), "Answered triple pattern lookup");
        stream::iter(triples.into_iter().map(Ok)).boxed()
    }

    fn eval_bgp(&self, bgp: &Bgp, _context: &ExecutionContext) -> ValueStream<Binding> {
        self.requests.record(Request::Bgp);
        let solutions = evaluate_bgp(&self.index.read(), bgp);
        tracing::trace!(%bgp, solutions = solutions.len(), "Evaluated BGP");
        stream::iter(solutions.into_iter().map(Ok)).boxed()
    }

    fn eval_union(
        &self,
        bgps: &[Bgp],
        _context: &ExecutionContext,
    ) -> Result<ValueStream<Binding>, StorageError> {
        if !self.capabilities.supports(Capability::UnionEvaluation) {
            return Err(StorageError::Unsupported(Capability::UnionEvaluation));
        }

        self.requests.record(Request::Union);
        let index = self.index.read();
        let solutions = bgps
            .iter()
            .flat_map(|bgp| evaluate_bgp(&index, bgp))
            .collect::<Vec<_>>();
        tracing::trace!(
            bgps = bgps.len(),
            solutions = solutions.len(),
            "Evaluated union of BGPs"
        );
        Ok(stream::iter(solutions.into_iter().map(Ok)).boxed())
    }

    async fn estimate_cardinality(
        &self,
        pattern: &TriplePattern,
        graph: &GraphName,
    ) -> Result<usize, StorageError> {
        if !self.capabilities.supports(Capability::CardinalityEstimation) {
            return Err(StorageError::Unsupported(
                Capability::CardinalityEstimation,
            ));
        }

        self.requests.record(Request::Estimate);
        Ok(self.index.read().scan(pattern, graph).len())
    }
}

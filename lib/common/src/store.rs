use crate::error::StorageError;
use crate::{Capability, ExecutionContext, StoreCapabilities};
use async_trait::async_trait;
use rdf_weave_model::{Bgp, Binding, GraphName, Triple, TriplePattern};
use rdf_weave_stage::ValueStream;
use std::fmt::Debug;

/// The data access layer the join operators evaluate against.
///
/// Stores are shared between executions as `Arc<dyn TripleStore>`. Every store supports
/// [TripleStore::find] and [TripleStore::eval_bgp]. The remaining operations are optional and
/// must be announced by [TripleStore::capabilities].
///
/// # Consistency
///
/// A query most often issues several requests to the same store. It is the responsibility of
/// the store to answer them from the same snapshot.
#[async_trait]
pub trait TripleStore: Debug + Send + Sync {
    /// Returns the capabilities of this store. They must not change over the store's lifetime.
    fn capabilities(&self) -> StoreCapabilities;

    /// Returns the triples of `graph` that match `pattern`.
    fn find(
        &self,
        pattern: &TriplePattern,
        graph: &GraphName,
        context: &ExecutionContext,
    ) -> ValueStream<Triple>;

    /// Returns the solutions of `bgp`.
    fn eval_bgp(&self, bgp: &Bgp, context: &ExecutionContext) -> ValueStream<Binding>;

    /// Returns the solutions of all `bgps` in a single stream.
    ///
    /// The solutions of the individual BGPs are not tagged. Callers that must tell them apart
    /// have to use distinct variable names per BGP.
    fn eval_union(
        &self,
        _bgps: &[Bgp],
        _context: &ExecutionContext,
    ) -> Result<ValueStream<Binding>, StorageError> {
        Err(StorageError::Unsupported(Capability::UnionEvaluation))
    }

    /// Returns an estimate of the number of triples of `graph` that match `pattern`.
    async fn estimate_cardinality(
        &self,
        _pattern: &TriplePattern,
        _graph: &GraphName,
    ) -> Result<usize, StorageError> {
        Err(StorageError::Unsupported(Capability::CardinalityEstimation))
    }
}

use crate::ExecutionContext;
use rdf_weave_model::{Bgp, Binding};
use rdf_weave_stage::StageEngine;

/// Evaluates a BGP for every binding of a source stage.
///
/// Operators that need to evaluate a nested BGP (e.g., the bound join for bindings that leave
/// nothing to join) call back into the evaluator instead of choosing a strategy themselves.
pub trait BgpEvaluator<E: StageEngine>: Send + Sync {
    /// Returns the solutions of `bgp` joined with every binding of `source`.
    fn evaluate(
        &self,
        engine: &E,
        source: E::Stage<Binding>,
        bgp: &Bgp,
        context: &ExecutionContext,
    ) -> E::Stage<Binding>;
}

//! Contracts between the execution core and its collaborators.
//!
//! The join operators never access data on their own. They rely on a [TripleStore] for data
//! access, on a [BgpEvaluator] for evaluating nested BGPs, and on an [ExecutionContext] that
//! carries per-execution settings and the optional [BgpCache](rdf_weave_cache::BgpCache).

mod capabilities;
mod context;
pub mod error;
mod evaluator;
mod store;

pub use capabilities::{Capability, StoreCapabilities};
pub use context::{ContextProperties, ExecutionContext, DEFAULT_BOUND_JOIN_BUCKET_SIZE};
pub use evaluator::BgpEvaluator;
pub use store::TripleStore;

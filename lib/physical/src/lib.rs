#![doc(test(attr(deny(warnings))))]

//! Contains the join operators of RDF Weave.
//!
//! Every operator is a plain function that receives the [StageEngine](rdf_weave_stage::StageEngine)
//! of the current execution and returns a new stage. Operators that access data do so through a
//! [TripleStore](rdf_weave_common::TripleStore).

mod bgp;
mod error;
pub mod join;
#[cfg(test)]
mod test_support;

pub use bgp::evaluate_cached_bgp;
pub use error::JoinError;
pub use join::{bound_join, hash_join, index_join, sym_hash_join, JoinTable, RewritingTable};
pub use rdf_weave_common::DEFAULT_BOUND_JOIN_BUCKET_SIZE;

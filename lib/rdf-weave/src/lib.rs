//! RDF Weave evaluates the basic graph patterns (BGPs) of SPARQL queries against pluggable triple
//! stores.
//!
//! The crate bundles:
//!
//! - [stage]: the sequence abstraction with an eager and a streaming engine,
//! - [physical]: hash joins, symmetric hash joins, index joins and bound joins,
//! - [cache]: a semantic cache of BGP results that can answer queries from cached subsets,
//! - [engine]: the default strategy for evaluating a BGP against a store.
//!
//! Stores plug in by implementing [common::TripleStore]. [storage::MemTripleStore] is an
//! in-memory implementation.
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod model {
    pub use rdf_weave_model::*;
}

pub mod stage {
    pub use rdf_weave_stage::*;
}

pub mod cache {
    pub use rdf_weave_cache::*;
}

pub mod common {
    pub use rdf_weave_common::*;
}

pub mod physical {
    pub use rdf_weave_physical::*;
}

pub mod storage {
    pub use rdf_weave_storage::*;
}

pub mod engine {
    pub use rdf_weave_engine::*;
}

//! An in-memory [TripleStore](rdf_weave_common::TripleStore).
//!
//! The store keeps all quads in memory and answers every request from the quads present when the
//! request was issued. It supports all store capabilities, but they can be restricted to
//! emulate less capable stores.

mod eval;
mod index;
mod statistics;
mod store;

pub use statistics::StoreStatistics;
pub use store::MemTripleStore;

#![doc(test(attr(deny(warnings))))]

//! Contains storage layer implementations for [RDF Weave](https://docs.rs/rdf-weave/).

pub mod memory;

pub use memory::{MemTripleStore, StoreStatistics};

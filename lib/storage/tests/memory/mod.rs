mod mem_triple_store;

use rdf_weave_common::StoreCapabilities;
use rdf_weave_storage::MemTripleStore;

fn create_store() -> MemTripleStore {
    MemTripleStore::with_capabilities(StoreCapabilities::all())
}

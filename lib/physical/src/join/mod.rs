mod bound;
mod hash;
mod index;
mod rewriting;
mod symmetric;
mod table;

pub use bound::bound_join;
pub use hash::hash_join;
pub use index::index_join;
pub use rewriting::RewritingTable;
pub use symmetric::sym_hash_join;
pub use table::JoinTable;

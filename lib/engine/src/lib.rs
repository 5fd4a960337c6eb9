//! Chooses how the BGPs of a query are evaluated.
//!
//! [DefaultBgpEvaluator] uses the bound join if the store can evaluate unions of BGPs. Otherwise,
//! it orders the patterns of a BGP ([order_patterns]) and evaluates them with a left-linear chain
//! of index joins.

mod evaluator;
mod ordering;

pub use evaluator::DefaultBgpEvaluator;
pub use ordering::{estimate_pattern_cardinality, order_patterns};

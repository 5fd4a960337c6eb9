use crate::memory::index::QuadIndex;
use rdf_weave_model::{bind_pattern, match_triple, Bgp, Binding};

/// Evaluates `bgp` with nested loops over the patterns in their given order.
///
/// The empty BGP has exactly one solution, the empty binding.
pub(crate) fn evaluate_bgp(index: &QuadIndex, bgp: &Bgp) -> Vec<Binding> {
    bgp.patterns()
        .iter()
        .fold(vec![Binding::new()], |solutions, pattern| {
            solutions
                .into_iter()
                .flat_map(|solution| {
                    let Some(bound) = bind_pattern(pattern, &solution) else {
                        return Vec::new();
                    };
                    index
                        .scan(&bound, bgp.graph())
                        .iter()
                        .filter_map(|triple| match_triple(&bound, triple))
                        .map(|matched| solution.union(&matched))
                        .collect()
                })
                .collect()
        })
}

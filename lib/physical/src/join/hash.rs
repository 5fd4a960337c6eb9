use crate::JoinTable;
use rdf_weave_model::{Binding, Variable};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;

/// Joins `left` and `right` on the variable `key`.
///
/// The operator first collects `right` into a [JoinTable] and then probes the table with every
/// binding of `left`. Hence, no binding is emitted before `right` is exhausted and the memory
/// consumption grows with the size of `right`.
pub fn hash_join<E: StageEngine>(
    engine: &E,
    left: E::Stage<Binding>,
    right: E::Stage<Binding>,
    key: Variable,
) -> E::Stage<Binding> {
    let table = engine.reduce(right, JoinTable::new(key), |mut table, binding| {
        table.put(binding);
        table
    });

    let inner = engine.clone();
    let mut left = Some(left);
    engine.merge_map(table, move |table| {
        let Some(left) = left.take() else {
            return inner.empty();
        };
        tracing::trace!(size = table.len(), "Built hash join table");

        let table = Arc::new(table);
        inner.flat_map(left, move |probe| table.join(&probe))
    })
}

use crate::JoinTable;
use parking_lot::Mutex;
use rdf_weave_model::{Binding, Variable};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;

enum Side {
    Left(Binding),
    Right(Binding),
}

/// The tables of both inputs. They share a lock such that every pair of matching bindings is
/// emitted exactly once, independent of the arrival order.
struct SymmetricTables {
    left: JoinTable,
    right: JoinTable,
}

impl SymmetricTables {
    fn accept(&mut self, side: Side) -> Vec<Binding> {
        match side {
            Side::Left(binding) => {
                let output = self
                    .right
                    .matches(&binding)
                    .iter()
                    .map(|right| binding.union(right))
                    .collect();
                self.left.put(binding);
                output
            }
            Side::Right(binding) => {
                let output = self
                    .left
                    .matches(&binding)
                    .iter()
                    .map(|left| left.union(&binding))
                    .collect();
                self.right.put(binding);
                output
            }
        }
    }
}

/// Joins `left` and `right` on the variable `key` without materializing either input first.
///
/// Every arriving binding is stored in the table of its side and probes the table of the other
/// side. The operator therefore produces results as soon as both sides delivered a matching pair
/// and yields the same result set as [hash_join](crate::hash_join).
pub fn sym_hash_join<E: StageEngine>(
    engine: &E,
    key: Variable,
    left: E::Stage<Binding>,
    right: E::Stage<Binding>,
) -> E::Stage<Binding> {
    let tables = Arc::new(Mutex::new(SymmetricTables {
        left: JoinTable::new(key.clone()),
        right: JoinTable::new(key),
    }));

    let sides = engine.merge(vec![
        engine.map(left, Side::Left),
        engine.map(right, Side::Right),
    ]);
    engine.flat_map(sides, move |side| tables.lock().accept(side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_join;
    use futures::StreamExt;
    use rdf_weave_model::Term;
    use rdf_weave_stage::{EagerEngine, StreamingEngine};

    fn term(value: &str) -> Term {
        Term::from(rdf_weave_model::NamedNode::new_unchecked(format!(
            "http://example.com/{value}"
        )))
    }

    fn row(values: &[(&str, &str)]) -> Binding {
        values
            .iter()
            .map(|(name, value)| (Variable::new_unchecked(*name), term(value)))
            .collect()
    }

    fn left() -> Vec<Binding> {
        vec![
            row(&[("x", "a"), ("l", "1")]),
            row(&[("x", "b"), ("l", "2")]),
            row(&[("l", "3")]),
            row(&[("x", "a"), ("l", "4")]),
        ]
    }

    fn right() -> Vec<Binding> {
        vec![
            row(&[("x", "a"), ("r", "1")]),
            row(&[("x", "c"), ("r", "2")]),
            row(&[("x", "a"), ("r", "3")]),
            row(&[("x", "b"), ("r", "4")]),
        ]
    }

    async fn sorted<E: StageEngine>(engine: &E, stage: E::Stage<Binding>) -> Vec<String> {
        let mut result = engine
            .to_vec(stage)
            .await
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        result.sort();
        result
    }

    async fn check_same_as_hash_join<E: StageEngine>(engine: E) {
        let x = Variable::new_unchecked("x");
        let symmetric = sym_hash_join(&engine, x.clone(), engine.of(left()), engine.of(right()));
        let hash = hash_join(&engine, engine.of(left()), engine.of(right()), x);

        let symmetric = sorted(&engine, symmetric).await;
        assert_eq!(symmetric.len(), 5);
        assert_eq!(symmetric, sorted(&engine, hash).await);
    }

    #[tokio::test]
    async fn same_result_set_as_hash_join() {
        check_same_as_hash_join(EagerEngine).await;
        check_same_as_hash_join(StreamingEngine).await;
    }

    #[tokio::test]
    async fn emits_before_inputs_are_exhausted() {
        let engine = StreamingEngine;
        let left = engine.from_stream(
            futures::stream::iter(vec![Ok(row(&[("x", "a")]))])
                .chain(futures::stream::pending())
                .boxed(),
        );
        let right = engine.of(vec![row(&[("x", "a"), ("r", "1")])]);

        let mut joined = engine.into_stream(sym_hash_join(
            &engine,
            Variable::new_unchecked("x"),
            left,
            right,
        ));

        let first = joined.next().await.unwrap().unwrap();
        assert_eq!(first, row(&[("x", "a"), ("r", "1")]));
    }
}

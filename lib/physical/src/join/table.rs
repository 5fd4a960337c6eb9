use rdf_weave_model::{Binding, Variable};
use rustc_hash::FxHashMap;

/// A multimap from the value of a join variable to the bindings that carry this value.
///
/// Values are keyed by their N-Triples serialization. Bindings in which the join variable is
/// missing or unbound are never stored and never match.
#[derive(Debug)]
pub struct JoinTable {
    variable: Variable,
    entries: FxHashMap<String, Vec<Binding>>,
    len: usize,
}

impl JoinTable {
    /// Creates an empty table for the join variable `variable`.
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            entries: FxHashMap::default(),
            len: 0,
        }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns the number of stored bindings.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the canonical join key of `binding`.
    pub fn key_of(&self, binding: &Binding) -> Option<String> {
        binding.get(&self.variable).map(ToString::to_string)
    }

    /// Stores `binding`. Returns `false` if the binding has no value for the join variable.
    pub fn put(&mut self, binding: Binding) -> bool {
        let Some(key) = self.key_of(&binding) else {
            return false;
        };
        self.entries.entry(key).or_default().push(binding);
        self.len += 1;
        true
    }

    /// Returns the stored bindings that share the join key of `probe`.
    pub fn matches(&self, probe: &Binding) -> &[Binding] {
        self.key_of(probe)
            .and_then(|key| self.entries.get(&key))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the union of `probe` with every stored binding that shares its join key.
    pub fn join(&self, probe: &Binding) -> Vec<Binding> {
        self.matches(probe)
            .iter()
            .map(|entry| entry.union(probe))
            .collect()
    }
}

use rdf_weave_model::{Bgp, TriplePattern};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::hash::BuildHasher;

/// The result of a subset search in the cache.
///
/// `subset` holds the patterns of the largest cached BGP contained in the queried BGP (in the
/// order of the cached BGP) and `missing` the queried patterns that are not covered by it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsetMatch {
    pub subset: Vec<TriplePattern>,
    pub missing: Vec<TriplePattern>,
}

impl SubsetMatch {
    /// A match without any cached pattern.
    pub(crate) fn none(bgp: &Bgp) -> Self {
        Self {
            subset: Vec::new(),
            missing: bgp.patterns().to_vec(),
        }
    }

    /// Returns whether the whole BGP is cached.
    pub fn is_exact(&self) -> bool {
        !self.subset.is_empty() && self.missing.is_empty()
    }

    /// Returns whether no part of the BGP is cached.
    pub fn is_miss(&self) -> bool {
        self.subset.is_empty()
    }
}

/// Maps the hash of a triple pattern to the cache keys of all BGPs that contain the pattern.
///
/// Hashes may collide. Candidates returned by this index must be verified with pattern equality.
#[derive(Debug, Default)]
pub(crate) struct SubsetIndex {
    patterns: FxHashMap<u64, FxHashSet<String>>,
}

impl SubsetIndex {
    pub(crate) fn insert(&mut self, key: &str, bgp: &Bgp) {
        for pattern in bgp.patterns() {
            self.patterns
                .entry(pattern_hash(pattern))
                .or_default()
                .insert(key.to_owned());
        }
    }

    pub(crate) fn remove(&mut self, key: &str, bgp: &Bgp) {
        for pattern in bgp.patterns() {
            let hash = pattern_hash(pattern);
            if let Some(keys) = self.patterns.get_mut(&hash) {
                keys.remove(key);
                if keys.is_empty() {
                    self.patterns.remove(&hash);
                }
            }
        }
    }

    /// Returns the keys of all BGPs that share at least one pattern hash with `bgp`.
    pub(crate) fn candidates(&self, bgp: &Bgp) -> FxHashSet<&str> {
        bgp.patterns()
            .iter()
            .filter_map(|pattern| self.patterns.get(&pattern_hash(pattern)))
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Returns the number of distinct pattern hashes in the index.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.patterns.len()
    }
}

fn pattern_hash(pattern: &TriplePattern) -> u64 {
    FxBuildHasher.hash_one(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_weave_model::{NamedNode, Variable};

    fn pattern(predicate: &str) -> TriplePattern {
        TriplePattern {
            subject: Variable::new_unchecked("s").into(),
            predicate: NamedNode::new_unchecked(format!("http://example.com/{predicate}")).into(),
            object: Variable::new_unchecked("o").into(),
        }
    }

    #[test]
    fn shared_patterns_keep_their_index_entry() {
        let mut index = SubsetIndex::default();
        let small = Bgp::in_default_graph(vec![pattern("a")]);
        let large = Bgp::in_default_graph(vec![pattern("a"), pattern("b")]);
        index.insert(&small.cache_key(), &small);
        index.insert(&large.cache_key(), &large);
        assert_eq!(index.len(), 2);

        index.remove(&large.cache_key(), &large);

        assert_eq!(index.len(), 1);
        let candidates = index.candidates(&large);
        assert_eq!(candidates.len(), 1);
        assert!(candidates.contains(small.cache_key().as_str()));
    }
}

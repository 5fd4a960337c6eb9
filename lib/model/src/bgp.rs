use crate::pattern::{is_ground_pattern, pattern_variables};
use crate::{GraphName, TriplePattern, Variable};
use std::fmt::{Display, Formatter};

/// A basic graph pattern: an ordered list of triple patterns evaluated against one graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bgp {
    patterns: Vec<TriplePattern>,
    graph: GraphName,
}

impl Bgp {
    /// Creates a new [Bgp] that is evaluated against `graph`.
    pub fn new(patterns: Vec<TriplePattern>, graph: GraphName) -> Self {
        Self { patterns, graph }
    }

    /// Creates a new [Bgp] that is evaluated against the default graph.
    pub fn in_default_graph(patterns: Vec<TriplePattern>) -> Self {
        Self::new(patterns, GraphName::DefaultGraph)
    }

    /// Returns a [Bgp] with the given `patterns` that targets the same graph as `self`.
    #[must_use]
    pub fn with_patterns(&self, patterns: Vec<TriplePattern>) -> Self {
        Self::new(patterns, self.graph.clone())
    }

    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    pub fn graph(&self) -> &GraphName {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns whether `pattern` is one of the patterns of this BGP.
    pub fn contains_pattern(&self, pattern: &TriplePattern) -> bool {
        self.patterns.contains(pattern)
    }

    /// Returns the distinct variables of this BGP in order of their first occurrence.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut result: Vec<&Variable> = Vec::new();
        for variable in self.patterns.iter().flat_map(pattern_variables) {
            if !result.contains(&variable) {
                result.push(variable);
            }
        }
        result
    }

    /// Returns whether no pattern of this BGP contains a variable.
    pub fn is_ground(&self) -> bool {
        self.patterns.iter().all(is_ground_pattern)
    }

    /// Returns the canonical string that identifies this BGP in a cache.
    ///
    /// The key concatenates the serialized subject, predicate and object of each pattern in
    /// order, followed by the graph identifier.
    pub fn cache_key(&self) -> String {
        let patterns = self
            .patterns
            .iter()
            .map(|pattern| {
                format!(
                    "{} {} {}",
                    pattern.subject, pattern.predicate, pattern.object
                )
            })
            .collect::<Vec<_>>()
            .join(" . ");
        format!("{patterns} @ {}", self.graph)
    }
}

impl Display for Bgp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

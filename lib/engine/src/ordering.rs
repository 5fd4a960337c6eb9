use itertools::Itertools;
use rdf_weave_model::{pattern_variables, NamedNodePattern, TermPattern, TriplePattern, Variable};
use std::collections::HashSet;

/// Orders `patterns` for a left-linear chain of joins.
///
/// `costs[i]` is the estimated cardinality of `patterns[i]`. The ordering starts with the
/// cheapest pattern and then greedily appends the cheapest pattern that shares a variable with
/// the patterns placed so far. Only if no remaining pattern shares a variable, the cheapest
/// remaining pattern starts a new (cross-joined) component. Ties keep the original order.
pub fn order_patterns(patterns: &[TriplePattern], costs: &[usize]) -> Vec<TriplePattern> {
    let mut remaining = patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| (pattern, costs.get(i).copied().unwrap_or(usize::MAX)))
        .collect::<Vec<_>>();
    let mut used_vars = HashSet::<&Variable>::new();
    let mut ordered = Vec::with_capacity(patterns.len());

    while !remaining.is_empty() {
        let connected = remaining
            .iter()
            .enumerate()
            .filter(|(_, (pattern, _))| pattern_variables(pattern).any(|v| used_vars.contains(v)))
            .min_by_key(|(_, (_, cost))| *cost)
            .map(|(i, _)| i);
        let next = connected.or_else(|| remaining.iter().position_min_by_key(|(_, cost)| *cost));
        let Some(next) = next else {
            break;
        };

        let (pattern, _) = remaining.remove(next);
        used_vars.extend(pattern_variables(pattern));
        ordered.push(pattern.clone());
    }

    ordered
}

/// Estimates the cardinality of a single triple pattern without statistics.
///
/// This uses the heuristics from Oxigraph's join reordering.
pub fn estimate_pattern_cardinality(pattern: &TriplePattern) -> usize {
    let subject_bound = matches!(
        &pattern.subject,
        TermPattern::NamedNode(_) | TermPattern::Literal(_)
    );
    let predicate_bound = matches!(&pattern.predicate, NamedNodePattern::NamedNode(_));
    let object_bound = matches!(
        &pattern.object,
        TermPattern::NamedNode(_) | TermPattern::Literal(_)
    );

    match (subject_bound, predicate_bound, object_bound) {
        (true, true, true) => 1,
        (true, true, false) => 10,
        (true, false, true) => 2,
        (false, true, true) => 10_000,
        (true, false, false) => 100,
        (false, false, false) => 1_000_000_000,
        (false, true, false) => 1_000_000,
        (false, false, true) => 100_000,
    }
}

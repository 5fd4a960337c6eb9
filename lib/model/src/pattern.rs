use crate::{Binding, NamedNodePattern, Term, TermPattern, Triple, TriplePattern, Variable};

/// Iterates over the variables of `pattern` in subject, predicate, object order.
///
/// A variable that occurs in several positions is returned once per occurrence.
pub fn pattern_variables(pattern: &TriplePattern) -> impl Iterator<Item = &Variable> {
    let subject = match &pattern.subject {
        TermPattern::Variable(variable) => Some(variable),
        _ => None,
    };
    let predicate = match &pattern.predicate {
        NamedNodePattern::Variable(variable) => Some(variable),
        NamedNodePattern::NamedNode(_) => None,
    };
    let object = match &pattern.object {
        TermPattern::Variable(variable) => Some(variable),
        _ => None,
    };
    subject.into_iter().chain(predicate).chain(object)
}

/// Returns whether `pattern` does not contain any variable.
pub fn is_ground_pattern(pattern: &TriplePattern) -> bool {
    pattern_variables(pattern).next().is_none()
}

/// Substitutes every variable of `pattern` that is bound in `binding`.
///
/// Returns [None] if the substitution yields a pattern that can never match, i.e., the predicate
/// variable is bound to something other than an IRI.
pub fn bind_pattern(pattern: &TriplePattern, binding: &Binding) -> Option<TriplePattern> {
    let predicate = match &pattern.predicate {
        NamedNodePattern::Variable(variable) => match binding.get(variable) {
            Some(Term::NamedNode(node)) => NamedNodePattern::NamedNode(node.clone()),
            Some(_) => return None,
            None => NamedNodePattern::Variable(variable.clone()),
        },
        NamedNodePattern::NamedNode(node) => NamedNodePattern::NamedNode(node.clone()),
    };

    Some(TriplePattern {
        subject: bind_term_pattern(&pattern.subject, binding),
        predicate,
        object: bind_term_pattern(&pattern.object, binding),
    })
}

fn bind_term_pattern(pattern: &TermPattern, binding: &Binding) -> TermPattern {
    match pattern {
        TermPattern::Variable(variable) => binding.get(variable).map_or_else(
            || TermPattern::Variable(variable.clone()),
            |term| TermPattern::from(term.clone()),
        ),
        other => other.clone(),
    }
}

/// Replaces every variable of `pattern` with the result of `rename`.
pub fn rename_pattern_variables(
    pattern: &TriplePattern,
    mut rename: impl FnMut(&Variable) -> Variable,
) -> TriplePattern {
    let mut rename_term = |term: &TermPattern| match term {
        TermPattern::Variable(variable) => TermPattern::Variable(rename(variable)),
        other => other.clone(),
    };
    let subject = rename_term(&pattern.subject);
    let object = rename_term(&pattern.object);
    let predicate = match &pattern.predicate {
        NamedNodePattern::Variable(variable) => NamedNodePattern::Variable(rename(variable)),
        NamedNodePattern::NamedNode(node) => NamedNodePattern::NamedNode(node.clone()),
    };
    TriplePattern {
        subject,
        predicate,
        object,
    }
}

/// Matches `triple` against `pattern` and returns the variables bound by the match.
///
/// Blank nodes in the pattern are treated as constants. Mapping them to variables is the
/// responsibility of the caller that builds the pattern.
pub fn match_triple(pattern: &TriplePattern, triple: &Triple) -> Option<Binding> {
    let mut binding = Binding::new();

    let subject = Term::from(triple.subject.clone());
    if !match_term(&pattern.subject, &subject, &mut binding) {
        return None;
    }

    let predicate_matches = match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => *node == triple.predicate,
        NamedNodePattern::Variable(variable) => bind_variable(
            variable,
            &Term::NamedNode(triple.predicate.clone()),
            &mut binding,
        ),
    };
    if !predicate_matches {
        return None;
    }

    if !match_term(&pattern.object, &triple.object, &mut binding) {
        return None;
    }

    Some(binding)
}

fn match_term(pattern: &TermPattern, term: &Term, binding: &mut Binding) -> bool {
    match (pattern, term) {
        (TermPattern::Variable(variable), term) => bind_variable(variable, term, binding),
        (TermPattern::NamedNode(expected), Term::NamedNode(actual)) => expected == actual,
        (TermPattern::BlankNode(expected), Term::BlankNode(actual)) => expected == actual,
        (TermPattern::Literal(expected), Term::Literal(actual)) => expected == actual,
        _ => false,
    }
}

/// Binds `variable` unless it is already bound to a different term.
fn bind_variable(variable: &Variable, term: &Term, binding: &mut Binding) -> bool {
    match binding.get(variable) {
        Some(existing) => existing == term,
        None => {
            binding.insert(variable.clone(), term.clone());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(value: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{value}"))
    }

    fn pattern(subject: TermPattern, predicate: NamedNodePattern, object: TermPattern) -> TriplePattern {
        TriplePattern {
            subject,
            predicate,
            object,
        }
    }

    #[test]
    fn bind_pattern_substitutes_bound_variables() {
        let pattern = pattern(var("s").into(), var("p").into(), var("o").into());
        let binding = Binding::from_iter([
            (var("s"), iri("a").into()),
            (var("p"), iri("knows").into()),
        ]);

        let bound = bind_pattern(&pattern, &binding).unwrap();

        assert_eq!(bound.subject, TermPattern::NamedNode(iri("a")));
        assert_eq!(bound.predicate, NamedNodePattern::NamedNode(iri("knows")));
        assert_eq!(bound.object, TermPattern::Variable(var("o")));
        assert!(!is_ground_pattern(&bound));
    }

    #[test]
    fn bind_pattern_rejects_literal_predicates() {
        let pattern = pattern(var("s").into(), var("p").into(), var("o").into());
        let binding = Binding::from_iter([(var("p"), Literal::new_simple_literal("x").into())]);

        assert_eq!(bind_pattern(&pattern, &binding), None);
    }

    #[test]
    fn match_triple_respects_repeated_variables() {
        let pattern = pattern(var("x").into(), iri("knows").into(), var("x").into());
        let reflexive = Triple::new(iri("a"), iri("knows"), iri("a"));
        let other = Triple::new(iri("a"), iri("knows"), iri("b"));

        let binding = match_triple(&pattern, &reflexive).unwrap();
        assert_eq!(binding.get(&var("x")), Some(&Term::from(iri("a"))));
        assert_eq!(binding.len(), 1);
        assert_eq!(match_triple(&pattern, &other), None);
    }

    #[test]
    fn match_triple_checks_constants() {
        let pattern = pattern(iri("a").into(), var("p").into(), Literal::new_simple_literal("1").into());
        let matching = Triple::new(iri("a"), iri("value"), Literal::new_simple_literal("1"));
        let different = Triple::new(iri("a"), iri("value"), Literal::new_simple_literal("2"));

        let binding = match_triple(&pattern, &matching).unwrap();
        assert_eq!(binding.get(&var("p")), Some(&Term::from(iri("value"))));
        assert_eq!(match_triple(&pattern, &different), None);
    }

    #[test]
    fn rename_pattern_variables_keeps_constants() {
        let pattern = pattern(var("s").into(), iri("knows").into(), var("o").into());

        let renamed = rename_pattern_variables(&pattern, |v| var(&format!("{}_3", v.as_str())));

        assert_eq!(renamed.subject, TermPattern::Variable(var("s_3")));
        assert_eq!(renamed.predicate, NamedNodePattern::NamedNode(iri("knows")));
        assert_eq!(renamed.object, TermPattern::Variable(var("o_3")));
    }
}

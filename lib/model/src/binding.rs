use crate::{Term, Variable};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A solution mapping from query variables to RDF terms.
///
/// A variable can also be present without a value. This is the explicit "unbound" state that,
/// for example, an optional pattern leaves behind. Unbound variables are reported by
/// [Binding::contains_variable] but never by [Binding::has] or [Binding::get].
///
/// Consumers treat bindings as values. Operations that produce a different mapping
/// ([Binding::with], [Binding::union], ...) return a new binding. The in-place mutators are
/// meant for code that owns a freshly created or explicitly cloned binding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    values: BTreeMap<Variable, Option<Term>>,
}

impl Binding {
    /// Creates an empty [Binding].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of variables in this binding, including unbound ones.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether this binding does not contain any variable.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the term bound to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.values.get(variable).and_then(Option::as_ref)
    }

    /// Returns whether `variable` is bound to a term.
    pub fn has(&self, variable: &Variable) -> bool {
        self.get(variable).is_some()
    }

    /// Returns whether `variable` is part of this binding, either bound or unbound.
    pub fn contains_variable(&self, variable: &Variable) -> bool {
        self.values.contains_key(variable)
    }

    /// Iterates over all variables of this binding in their canonical order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    /// Iterates over all bound variables and their terms.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.values
            .iter()
            .filter_map(|(variable, term)| term.as_ref().map(|term| (variable, term)))
    }

    /// Binds `variable` to `term`, replacing a previous value.
    pub fn insert(&mut self, variable: Variable, term: Term) {
        self.values.insert(variable, Some(term));
    }

    /// Marks `variable` as explicitly unbound.
    pub fn insert_unbound(&mut self, variable: Variable) {
        self.values.insert(variable, None);
    }

    /// Returns a copy of this binding with `variable` bound to `term`.
    #[must_use]
    pub fn with(&self, variable: Variable, term: Term) -> Self {
        let mut result = self.clone();
        result.insert(variable, term);
        result
    }

    /// Returns a copy of this binding with `variable` marked as unbound.
    #[must_use]
    pub fn with_unbound(&self, variable: Variable) -> Self {
        let mut result = self.clone();
        result.insert_unbound(variable);
        result
    }

    /// Merges `other` into a copy of this binding.
    ///
    /// Bound values of `other` take precedence. An unbound variable of `other` is only added if
    /// this binding does not know the variable yet.
    #[must_use]
    pub fn union(&self, other: &Binding) -> Self {
        let mut result = self.clone();
        for (variable, term) in &other.values {
            match term {
                Some(term) => result.insert(variable.clone(), term.clone()),
                None => {
                    result.values.entry(variable.clone()).or_insert(None);
                }
            }
        }
        result
    }

    /// Returns whether no variable is bound to different terms in `self` and `other`.
    pub fn is_compatible(&self, other: &Binding) -> bool {
        self.iter()
            .all(|(variable, term)| other.get(variable).map_or(true, |other| other == term))
    }

    /// Returns a new binding where every variable is replaced by the result of `f`.
    #[must_use]
    pub fn map_variables(&self, mut f: impl FnMut(&Variable) -> Variable) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(variable, term)| (f(variable), term.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(Variable, Term)> for Binding {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(variable, term)| (variable, Some(term)))
                .collect(),
        }
    }
}

impl Extend<(Variable, Term)> for Binding {
    fn extend<T: IntoIterator<Item = (Variable, Term)>>(&mut self, iter: T) {
        for (variable, term) in iter {
            self.insert(variable, term);
        }
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match term {
                Some(term) => write!(f, "{variable} -> {term}")?,
                None => write!(f, "{variable} -> UNBOUND")?,
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(value: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.com/{value}")).into()
    }

    #[test]
    fn unbound_variables_are_not_reported_as_bound() {
        let binding = Binding::new().with_unbound(var("x"));

        assert!(binding.contains_variable(&var("x")));
        assert!(!binding.has(&var("x")));
        assert_eq!(binding.get(&var("x")), None);
        assert_eq!(binding.iter().count(), 0);
    }

    #[test]
    fn union_prefers_bound_values_of_other() {
        let left = Binding::from_iter([(var("x"), iri("a")), (var("y"), iri("b"))]);
        let right = Binding::new()
            .with(var("y"), iri("c"))
            .with_unbound(var("x"))
            .with_unbound(var("z"));

        let union = left.union(&right);

        assert_eq!(union.get(&var("x")), Some(&iri("a")));
        assert_eq!(union.get(&var("y")), Some(&iri("c")));
        assert!(union.contains_variable(&var("z")));
        assert_eq!(union.len(), 3);
        // The inputs stay untouched.
        assert_eq!(left.get(&var("y")), Some(&iri("b")));
    }

    #[test]
    fn compatibility_ignores_disjoint_variables() {
        let left = Binding::from_iter([(var("x"), iri("a"))]);
        let same = Binding::from_iter([(var("x"), iri("a")), (var("y"), iri("b"))]);
        let other = Binding::from_iter([(var("x"), iri("b"))]);

        assert!(left.is_compatible(&same));
        assert!(left.is_compatible(&Binding::new()));
        assert!(!left.is_compatible(&other));
    }

    #[test]
    fn display_lists_variables_in_order() {
        let binding = Binding::from_iter([
            (var("y"), Literal::new_simple_literal("1").into()),
            (var("x"), iri("a")),
        ])
        .with_unbound(var("z"));

        assert_eq!(
            binding.to_string(),
            "{?x -> <http://example.com/a>, ?y -> \"1\", ?z -> UNBOUND}"
        );
    }
}

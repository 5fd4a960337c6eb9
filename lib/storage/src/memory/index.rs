use rdf_weave_model::{
    match_triple, GraphName, NamedNode, NamedNodePattern, Quad, Term, TermPattern, Triple,
    TriplePattern,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// The component of a triple that is used to narrow down a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IndexComponent {
    Subject,
    Predicate,
    Object,
}

/// Holds the quads of the store together with one hash index per triple component.
///
/// Different patterns are best served by different indexes. `<S> ?p ?o` is answered from the
/// subject index while `?s ?p <O>` is answered from the object index. [QuadIndex::choose_index]
/// picks the index for a given pattern.
#[derive(Debug, Default)]
pub(crate) struct QuadIndex {
    quads: Vec<Quad>,
    contained: FxHashSet<Quad>,
    by_subject: FxHashMap<Term, Vec<usize>>,
    by_predicate: FxHashMap<NamedNode, Vec<usize>>,
    by_object: FxHashMap<Term, Vec<usize>>,
}

impl QuadIndex {
    pub(crate) fn len(&self) -> usize {
        self.quads.len()
    }

    /// Inserts `quad`. Returns `false` if the quad was already present.
    pub(crate) fn insert(&mut self, quad: Quad) -> bool {
        if !self.contained.insert(quad.clone()) {
            return false;
        }

        let position = self.quads.len();
        self.by_subject
            .entry(Term::from(quad.subject.clone()))
            .or_default()
            .push(position);
        self.by_predicate
            .entry(quad.predicate.clone())
            .or_default()
            .push(position);
        self.by_object
            .entry(quad.object.clone())
            .or_default()
            .push(position);
        self.quads.push(quad);
        true
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Chooses the most selective index for scanning `pattern`.
    ///
    /// Returns [None] if no component of `pattern` is bound.
    pub(crate) fn choose_index(&self, pattern: &TriplePattern) -> Option<IndexComponent> {
        let subject = ground_term(&pattern.subject)
            .map(|term| (IndexComponent::Subject, self.by_subject.get(&term).map_or(0, Vec::len)));
        let predicate = match &pattern.predicate {
            NamedNodePattern::NamedNode(node) => Some((
                IndexComponent::Predicate,
                self.by_predicate.get(node).map_or(0, Vec::len),
            )),
            NamedNodePattern::Variable(_) => None,
        };
        let object = ground_term(&pattern.object)
            .map(|term| (IndexComponent::Object, self.by_object.get(&term).map_or(0, Vec::len)));

        [subject, predicate, object]
            .into_iter()
            .flatten()
            .min_by_key(|(_, size)| *size)
            .map(|(component, _)| component)
    }

    /// Returns the triples of `graph` that match `pattern`.
    pub(crate) fn scan(&self, pattern: &TriplePattern, graph: &GraphName) -> Vec<Triple> {
        let candidates: Box<dyn Iterator<Item = &Quad> + '_> = match self.choose_index(pattern) {
            None => Box::new(self.quads.iter()),
            Some(component) => Box::new(
                self.positions(pattern, component)
                    .iter()
                    .filter_map(|position| self.quads.get(*position)),
            ),
        };

        candidates
            .filter(|quad| quad.graph_name == *graph)
            .map(|quad| {
                Triple::new(
                    quad.subject.clone(),
                    quad.predicate.clone(),
                    quad.object.clone(),
                )
            })
            .filter(|triple| match_triple(pattern, triple).is_some())
            .collect()
    }

    fn positions(&self, pattern: &TriplePattern, component: IndexComponent) -> &[usize] {
        let positions = match component {
            IndexComponent::Subject => {
                ground_term(&pattern.subject).and_then(|term| self.by_subject.get(&term))
            }
            IndexComponent::Predicate => match &pattern.predicate {
                NamedNodePattern::NamedNode(node) => self.by_predicate.get(node),
                NamedNodePattern::Variable(_) => None,
            },
            IndexComponent::Object => {
                ground_term(&pattern.object).and_then(|term| self.by_object.get(&term))
            }
        };
        positions.map_or(&[], Vec::as_slice)
    }
}

fn ground_term(pattern: &TermPattern) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::BlankNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        _ => None,
    }
}

use std::fmt::{Display, Formatter};

/// An optional operation of a [TripleStore](crate::TripleStore).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Evaluating a single triple pattern ([TripleStore::find](crate::TripleStore::find)).
    TriplePatternLookup,
    /// Evaluating a whole BGP ([TripleStore::eval_bgp](crate::TripleStore::eval_bgp)).
    BgpEvaluation,
    /// Evaluating a union of BGPs in one request
    /// ([TripleStore::eval_union](crate::TripleStore::eval_union)).
    UnionEvaluation,
    /// Estimating the number of matches of a triple pattern
    /// ([TripleStore::estimate_cardinality](crate::TripleStore::estimate_cardinality)).
    CardinalityEstimation,
}

impl Capability {
    const ALL: [Self; 4] = [
        Self::TriplePatternLookup,
        Self::BgpEvaluation,
        Self::UnionEvaluation,
        Self::CardinalityEstimation,
    ];

    fn bit(self) -> u8 {
        match self {
            Self::TriplePatternLookup => 1,
            Self::BgpEvaluation => 1 << 1,
            Self::UnionEvaluation => 1 << 2,
            Self::CardinalityEstimation => 1 << 3,
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TriplePatternLookup => "triple pattern lookup",
            Self::BgpEvaluation => "BGP evaluation",
            Self::UnionEvaluation => "union evaluation",
            Self::CardinalityEstimation => "cardinality estimation",
        };
        f.write_str(name)
    }
}

/// The set of [Capability]s of a store. The set is fixed when the store is created.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StoreCapabilities {
    bits: u8,
}

impl StoreCapabilities {
    /// The capabilities every store must provide.
    pub fn basic() -> Self {
        Self::default()
            .with(Capability::TriplePatternLookup)
            .with(Capability::BgpEvaluation)
    }

    /// All known capabilities.
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    #[must_use]
    pub fn with(self, capability: Capability) -> Self {
        Self {
            bits: self.bits | capability.bit(),
        }
    }

    #[must_use]
    pub fn without(self, capability: Capability) -> Self {
        Self {
            bits: self.bits & !capability.bit(),
        }
    }

    pub fn supports(self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.supports(*capability))
    }
}

impl FromIterator<Capability> for StoreCapabilities {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::with)
    }
}

impl std::fmt::Debug for StoreCapabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

mod bgp;
mod binding;
mod pattern;

pub use bgp::Bgp;
pub use binding::Binding;
pub use pattern::{
    bind_pattern, is_ground_pattern, match_triple, pattern_variables, rename_pattern_variables,
};

// Re-export some oxrdf types.
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Quad, QuadRef, Subject, Term, TermRef, Triple, TripleRef, Variable, VariableRef,
};

// Re-export the pattern types of spargebra.
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};

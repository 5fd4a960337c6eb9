use rdf_weave_common::Capability;
use rdf_weave_stage::StageError;

/// An error that prevents a join operator from being built.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum JoinError {
    /// The operator relies on an operation the store does not provide.
    #[error("{operator} requires a store that supports {capability}")]
    MissingCapability {
        operator: &'static str,
        capability: Capability,
    },
}

impl From<JoinError> for StageError {
    #[inline]
    fn from(error: JoinError) -> Self {
        Self::external(error)
    }
}

use crate::Capability;
use rdf_weave_stage::StageError;
use std::error::Error;

/// An error related to store operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The store does not provide the requested operation.
    #[error("The store does not support {0}")]
    Unsupported(Capability),
    /// The store rejected a request (e.g., a pattern it cannot answer).
    #[error("Invalid store request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl From<StorageError> for StageError {
    #[inline]
    fn from(error: StorageError) -> Self {
        Self::external(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_message_as_stage_errors() {
        let error = StageError::from(StorageError::Unsupported(Capability::UnionEvaluation));
        assert_eq!(
            error.to_string(),
            "The store does not support union evaluation"
        );
        assert!(error.source().is_some());
    }
}

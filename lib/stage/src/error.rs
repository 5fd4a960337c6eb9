use std::error::Error;
use std::sync::Arc;

pub type StageResult<T> = Result<T, StageError>;

/// An error that terminates a stage.
///
/// The error is cheap to clone, as replayed stages hand the same error to every consumer.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum StageError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    External(#[source] Arc<dyn Error + Send + Sync + 'static>),
}

impl StageError {
    /// Builds an error from a printable error message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Wraps an error of another component (e.g., the storage layer).
    pub fn external(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::External(Arc::from(error.into()))
    }
}

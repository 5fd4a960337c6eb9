use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifies the execution that is allowed to build a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WriterId(Uuid);

impl WriterId {
    /// Creates a new random [WriterId].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for WriterId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for WriterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

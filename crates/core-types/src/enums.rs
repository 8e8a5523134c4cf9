use serde::{Deserialize, Serialize};

/// The kind of access a request needs on an account or strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    Read,
    Edit,
}

impl AccessLevel {
    /// Returns true when this level only needs read rights.
    pub fn is_read_only(&self) -> bool {
        matches!(self, AccessLevel::Read)
    }
}

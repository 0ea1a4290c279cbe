//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent rejected tree operations.
/// None of them leave the tree in an inconsistent state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tree is empty")]
    EmptyTree,

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("parent node not found: {0}")]
    ParentNotFound(String),

    #[error("no child '{id}' below current node '{current}'")]
    ChildNotFound { id: String, current: String },

    #[error("cannot remove root node '{0}': use set_root or clear instead")]
    RootRemoval(String),

    #[error("no journey in progress: call start_journey first")]
    NoActiveJourney,

    #[error("cannot go back: journey is at its start")]
    NavigationBoundary,

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("malformed tree record: {0}")]
    MalformedRecord(String),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

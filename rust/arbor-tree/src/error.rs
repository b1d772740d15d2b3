use arbor_store::ArborStoreError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum ArborTreeError {
    /// A candidate payload failed validation; nothing reached storage
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A structural precondition was violated; nothing reached storage
    #[error("{0}")]
    Structure(#[from] StructureError),

    /// An error propagated unchanged from the storage collaborator
    #[error("{0}")]
    Store(#[from] ArborStoreError),
}

/// A violated tree invariant, checked before any storage mutation.
///
/// Each variant names the precondition that failed, so callers can match on
/// the exact cause rather than parsing a message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    /// An insertion was attempted with a node that is already persisted
    #[error("The node can't be inserted because it is not new")]
    NodeNotNew,

    /// A move or delete was attempted with a node that was never persisted
    #[error("The node should not be new")]
    NodeIsNew,

    /// The node was already removed from storage
    #[error("The node should not be deleted")]
    NodeDeleted,

    /// The target node was already removed from storage
    #[error("The target node should not be deleted")]
    TargetDeleted,

    /// A node was given as its own target
    #[error("The target node should not be self")]
    TargetIsSelf,

    /// Moving under this target would detach the subtree into itself
    #[error("The target node should not be a descendant")]
    TargetIsDescendant,

    /// The node is already a root
    #[error("The node is already a root")]
    AlreadyRoot,

    /// A forest operation was attempted with multi-root mode disabled
    #[error("Multi-root mode is off")]
    NotManyRoots,

    /// A second root was attempted in single-root mode
    #[error("Can't create more than one root in single-root mode")]
    RootExists,

    /// A root-relative operation found no existing root
    #[error("No roots found")]
    NoRoots,

    /// The node is missing its store identity or bounds where they are
    /// required
    #[error("The node has not been assigned a tree position")]
    Unpersisted,
}

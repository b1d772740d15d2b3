use std::sync::{Arc, Weak};

use arbor_store::{Bounds, RowId};
use parking_lot::RwLock;

/// Pre-persistence validation of a node payload.
///
/// [`Tree`](crate::Tree) runs this before any insert or update reaches the
/// store; a rejection surfaces as
/// [`ArborTreeError::Validation`](crate::ArborTreeError::Validation). The
/// default implementation accepts everything.
pub trait Validate {
    /// Check the payload, returning a human-readable reason on rejection.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// The mutable state behind a [`Node`] handle.
///
/// Tree attributes are written exclusively by the operation engine and the
/// corrector; nothing outside this crate can reach them mutably.
pub(crate) struct NodeState<Data> {
    pub(crate) id: Option<RowId>,
    pub(crate) bounds: Option<Bounds>,
    pub(crate) deleted: bool,
    pub(crate) data: Data,
}

pub(crate) type SharedState<Data> = Arc<RwLock<NodeState<Data>>>;
pub(crate) type WeakState<Data> = Weak<RwLock<NodeState<Data>>>;

/// A live, in-memory view of one tree node.
///
/// Handles are created by [`Tree`](crate::Tree) - either freshly via
/// [`Tree::create`](crate::Tree::create) or by loading rows through the query
/// accessors - and every handle is registered with the engine's registry so
/// that later structural mutations can repair its boundaries in place.
/// Cloning a [`Node`] yields another handle to the same state.
pub struct Node<Data> {
    state: SharedState<Data>,
}

impl<Data> Clone for Node<Data> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<Data> Node<Data> {
    pub(crate) fn new(data: Data) -> Self {
        Self {
            state: Arc::new(RwLock::new(NodeState {
                id: None,
                bounds: None,
                deleted: false,
                data,
            })),
        }
    }

    pub(crate) fn state(&self) -> &SharedState<Data> {
        &self.state
    }

    /// The store-assigned row id, present once the node has been persisted.
    pub fn id(&self) -> Option<RowId> {
        self.state.read().id
    }

    /// The node's current tree position, present once the node has been
    /// persisted.
    pub fn bounds(&self) -> Option<Bounds> {
        self.state.read().bounds
    }

    /// Whether this node has never been persisted.
    pub fn is_new(&self) -> bool {
        self.state.read().id.is_none()
    }

    /// Whether this node's row (or an ancestor's subtree) has been removed
    /// from storage.
    pub fn is_deleted(&self) -> bool {
        self.state.read().deleted
    }

    /// Whether this node has no descendants. `false` for unpersisted nodes.
    pub fn is_leaf(&self) -> bool {
        self.bounds().is_some_and(|bounds| bounds.is_leaf())
    }

    /// Whether this node is the root of its tree. `false` for unpersisted
    /// nodes.
    pub fn is_root(&self) -> bool {
        self.bounds().is_some_and(|bounds| bounds.level == 1)
    }

    /// Whether this node lies strictly inside `other`'s subtree.
    ///
    /// Irreflexive: a node is not a descendant of itself.
    pub fn is_descendant_of(&self, other: &Node<Data>) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(own), Some(theirs)) => own.is_inside(&theirs),
            _ => false,
        }
    }

    /// Replace the in-memory payload. Persist it with
    /// [`Tree::save`](crate::Tree::save).
    pub fn set_data(&self, data: Data) {
        self.state.write().data = data;
    }

    /// Whether two handles refer to the same node, either by sharing state
    /// or by agreeing on a persisted row id.
    pub fn same_node(&self, other: &Node<Data>) -> bool {
        if Arc::ptr_eq(&self.state, &other.state) {
            return true;
        }
        matches!((self.id(), other.id()), (Some(own), Some(theirs)) if own == theirs)
    }
}

impl<Data> Node<Data>
where
    Data: Clone,
{
    /// A copy of the node's payload.
    pub fn data(&self) -> Data {
        self.state.read().data.clone()
    }
}

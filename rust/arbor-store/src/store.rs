use async_trait::async_trait;

use crate::{ArborStoreError, Bounds, Filter, NodeRecord, Order, RowId, TreeAttr};

/// A [`NodeStore`] is a facade over some relational substrate that persists
/// tree-encoded rows and can apply range-filtered bulk mutations to them.
///
/// The bulk operations are the load-bearing part of the contract: a
/// structural tree mutation is expressed as a small, bounded number of
/// [`NodeStore::shift`] and [`NodeStore::delete_where`] calls regardless of
/// how many rows are affected, never as row-at-a-time rewrites.
///
/// Transactions are reentrant: a nested [`NodeStore::begin`] joins the
/// already-open transaction and the matching [`NodeStore::commit`] completes
/// only at the outermost level. [`NodeStore::rollback`] aborts the whole
/// transaction regardless of depth. Implementations shared across threads
/// must provide isolation sufficient to keep two concurrent structural
/// mutations on the same tree from interleaving; this crate does not add any
/// locking of its own.
#[async_trait]
pub trait NodeStore<Data>: Send + Sync
where
    Data: Clone + Send + Sync + 'static,
{
    /// Retrieve every row matching `filter`, in the given order (insertion
    /// order when `order` is `None`).
    async fn select(
        &self,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<NodeRecord<Data>>, ArborStoreError>;

    /// Add `delta` to the named attribute of every row matching `filter`,
    /// as one bulk statement. Returns the number of affected rows.
    ///
    /// This is never idempotent; callers invoke it exactly once per logical
    /// shift.
    async fn shift(
        &mut self,
        attr: TreeAttr,
        filter: &Filter,
        delta: i64,
    ) -> Result<u64, ArborStoreError>;

    /// Delete every row matching `filter`. Returns the number of deleted
    /// rows.
    async fn delete_where(&mut self, filter: &Filter) -> Result<u64, ArborStoreError>;

    /// Insert a single row, returning its store-assigned [`RowId`].
    async fn insert(&mut self, bounds: Bounds, data: Data) -> Result<RowId, ArborStoreError>;

    /// Delete a single row by id.
    async fn delete(&mut self, id: RowId) -> Result<(), ArborStoreError>;

    /// Replace the payload of a single row. The row's tree attributes are
    /// not reachable through this entry point.
    async fn update_data(&mut self, id: RowId, data: Data) -> Result<(), ArborStoreError>;

    /// Open a transaction, or join the one already open.
    async fn begin(&mut self) -> Result<(), ArborStoreError>;

    /// Commit the current transaction level. Changes persist once the
    /// outermost level commits.
    async fn commit(&mut self) -> Result<(), ArborStoreError>;

    /// Abort the whole transaction, discarding every change made since the
    /// outermost [`NodeStore::begin`].
    async fn rollback(&mut self) -> Result<(), ArborStoreError>;
}

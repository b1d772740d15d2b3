use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{ArborStoreError, Bounds, Filter, NodeRecord, NodeStore, Order, RowId, TreeAttr};

/// A trivial implementation of [`NodeStore`] - backed by a [`BTreeMap`] -
/// where all rows are kept in memory and never persisted.
///
/// Transactions are implemented by snapshotting the whole row table at the
/// outermost [`NodeStore::begin`]; rollback restores the snapshot. Because a
/// transaction holds no locks between calls, this backend serializes
/// concurrent structural mutations only if callers do - which matches the
/// contract of the trait.
#[derive(Clone)]
pub struct MemoryNodeStore<Data>
where
    Data: Clone,
{
    inner: Arc<RwLock<Inner<Data>>>,
}

// Manual impl: the derive would bound `Data: Default`, but an empty store
// holds no payloads.
impl<Data> Default for MemoryNodeStore<Data>
where
    Data: Clone,
{
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

struct Inner<Data> {
    rows: BTreeMap<RowId, NodeRecord<Data>>,
    next_id: u64,
    transaction: Option<Transaction<Data>>,
}

struct Transaction<Data> {
    rows: BTreeMap<RowId, NodeRecord<Data>>,
    next_id: u64,
    depth: usize,
}

impl<Data> Default for Inner<Data> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
            transaction: None,
        }
    }
}

impl<Data> MemoryNodeStore<Data>
where
    Data: Clone,
{
    /// Retrieve a single row by id, if it exists.
    pub async fn get(&self, id: RowId) -> Option<NodeRecord<Data>> {
        let inner = self.inner.read().await;
        inner.rows.get(&id).cloned()
    }

    /// The number of rows currently held.
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.rows.len()
    }

    /// Whether the store holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<Data> NodeStore<Data> for MemoryNodeStore<Data>
where
    Data: Clone + Send + Sync + 'static,
{
    async fn select(
        &self,
        filter: &Filter,
        order: Option<Order>,
    ) -> Result<Vec<NodeRecord<Data>>, ArborStoreError> {
        let inner = self.inner.read().await;
        let mut rows = inner
            .rows
            .values()
            .filter(|record| filter.matches(&record.bounds))
            .cloned()
            .collect::<Vec<_>>();

        if let Some(order) = order {
            rows.sort_by_key(|record| record.bounds.get(order.attr));
            if order.descending {
                rows.reverse();
            }
        }

        Ok(rows)
    }

    async fn shift(
        &mut self,
        attr: TreeAttr,
        filter: &Filter,
        delta: i64,
    ) -> Result<u64, ArborStoreError> {
        let mut inner = self.inner.write().await;
        let mut affected = 0;

        for record in inner.rows.values_mut() {
            if filter.matches(&record.bounds) {
                *record.bounds.get_mut(attr) += delta;
                affected += 1;
            }
        }

        Ok(affected)
    }

    async fn delete_where(&mut self, filter: &Filter) -> Result<u64, ArborStoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|_, record| !filter.matches(&record.bounds));
        Ok((before - inner.rows.len()) as u64)
    }

    async fn insert(&mut self, bounds: Bounds, data: Data) -> Result<RowId, ArborStoreError> {
        let mut inner = self.inner.write().await;
        let id = RowId::new(inner.next_id);
        inner.next_id += 1;
        inner.rows.insert(id, NodeRecord { id, bounds, data });
        Ok(id)
    }

    async fn delete(&mut self, id: RowId) -> Result<(), ArborStoreError> {
        let mut inner = self.inner.write().await;
        inner
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(ArborStoreError::AbsentRow(id))
    }

    async fn update_data(&mut self, id: RowId, data: Data) -> Result<(), ArborStoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .rows
            .get_mut(&id)
            .ok_or(ArborStoreError::AbsentRow(id))?;
        record.data = data;
        Ok(())
    }

    async fn begin(&mut self) -> Result<(), ArborStoreError> {
        let mut inner = self.inner.write().await;
        match inner.transaction.as_mut() {
            Some(transaction) => {
                transaction.depth += 1;
            }
            None => {
                inner.transaction = Some(Transaction {
                    rows: inner.rows.clone(),
                    next_id: inner.next_id,
                    depth: 1,
                });
            }
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), ArborStoreError> {
        let mut inner = self.inner.write().await;
        let transaction = inner
            .transaction
            .as_mut()
            .ok_or_else(|| ArborStoreError::Transaction("no open transaction to commit".into()))?;

        transaction.depth -= 1;
        if transaction.depth == 0 {
            inner.transaction = None;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ArborStoreError> {
        let mut inner = self.inner.write().await;
        let transaction = inner
            .transaction
            .take()
            .ok_or_else(|| ArborStoreError::Transaction("no open transaction to roll back".into()))?;

        inner.rows = transaction.rows;
        inner.next_id = transaction.next_id;
        Ok(())
    }
}

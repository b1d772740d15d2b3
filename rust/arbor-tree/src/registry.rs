use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;

use crate::{Correction, SharedState, WeakState};

/// An enumeration of every live [`Node`](crate::Node) handle created by one
/// engine, so a committed mutation can be broadcast to all of them.
///
/// The registry is scoped to its owning [`Tree`](crate::Tree) rather than
/// being process-wide: discarding the engine discards the registry with it.
/// Entries are weak - the registry never keeps a node alive - and ids come
/// from a per-registry monotonic counter. Handles whose last strong
/// reference is gone are pruned as they are encountered.
///
/// This is not a lookup cache; nothing is ever retrieved by key. The single
/// mutex both guards the map and serializes correction passes, since a
/// correction iterates and mutates live node fields.
pub struct Registry<Data> {
    inner: Mutex<Inner<Data>>,
}

struct Inner<Data> {
    next_id: u64,
    entries: BTreeMap<u64, WeakState<Data>>,
}

impl<Data> Default for Registry<Data> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 0,
                entries: BTreeMap::new(),
            }),
        }
    }
}

impl<Data> Registry<Data> {
    pub(crate) fn register(&self, state: &SharedState<Data>) -> u64 {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(id, Arc::downgrade(state));
        id
    }

    /// Apply `correction` to every live entry exactly once, skipping the
    /// excluded handle (the row the mutation just wrote, which already holds
    /// fresh values).
    pub(crate) fn correct(&self, correction: &Correction, exclude: Option<&SharedState<Data>>) {
        let mut inner = self.inner.lock();
        let mut dead = Vec::new();

        for (id, entry) in inner.entries.iter() {
            let Some(state) = entry.upgrade() else {
                dead.push(*id);
                continue;
            };

            if let Some(excluded) = exclude
                && Arc::ptr_eq(&state, excluded)
            {
                continue;
            }

            correction.apply(&mut state.write());
        }

        for id in dead {
            inner.entries.remove(&id);
        }
    }

    /// The number of entries whose node handle is still alive.
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .entries
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }
}

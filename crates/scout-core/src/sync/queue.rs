//! Pending mutation queues persisted in the local durable cache.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::{keys, DurableCache};
use crate::models::{upsert_pit_entry, EntryId, PitScoutingEntry, ScoutingEntry};

/// Ordered, not-yet-acknowledged writes.
///
/// Each queue is one JSON document rewritten as a whole on every change.
/// Read-modify-write cycles are serialized by an async lock so that a save
/// racing a drain never loses a record.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    cache: DurableCache,
    lock: Arc<Mutex<()>>,
}

impl PendingQueue {
    pub fn new(cache: DurableCache) -> Self {
        Self {
            cache,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Queued match entries in enqueue order
    pub fn entries(&self) -> Vec<ScoutingEntry> {
        self.cache
            .load(keys::PENDING_ENTRIES)
            .unwrap_or_default()
    }

    /// Queued pit entries in enqueue order
    pub fn pit_entries(&self) -> Vec<PitScoutingEntry> {
        self.cache
            .load(keys::PENDING_PIT_ENTRIES)
            .unwrap_or_default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    /// Total queued records across both queues
    pub fn len(&self) -> usize {
        self.entry_count() + self.pit_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an entry; returns `false` when the same id is already queued.
    pub async fn push_entry(&self, entry: ScoutingEntry) -> bool {
        let _guard = self.lock.lock().await;
        let mut pending = self.entries();
        if pending.iter().any(|queued| queued.id == entry.id) {
            return false;
        }
        pending.push(entry);
        self.cache.store(keys::PENDING_ENTRIES, &pending);
        true
    }

    /// Queue a pit entry, replacing a queued entry for the same team and event in place.
    pub async fn upsert_pit_entry(&self, entry: PitScoutingEntry) {
        let _guard = self.lock.lock().await;
        let mut pending = self.pit_entries();
        if let Some(existing) = pending.iter_mut().find(|queued| queued.same_key(&entry)) {
            *existing = entry;
        } else {
            pending.push(entry);
        }
        self.cache.store(keys::PENDING_PIT_ENTRIES, &pending);
    }

    /// Rewrite the entry queue after a sweep over `swept`.
    ///
    /// The new queue is `still_pending` followed by anything enqueued while the
    /// sweep was running. Records that were swept and accepted drop out, and so
    /// do still-pending records removed from the queue during the sweep.
    pub async fn settle_entries(&self, swept: &[ScoutingEntry], still_pending: Vec<ScoutingEntry>) {
        let _guard = self.lock.lock().await;
        let current = self.entries();
        let current_ids: HashSet<&EntryId> = current.iter().map(|entry| &entry.id).collect();
        let swept_ids: HashSet<&EntryId> = swept.iter().map(|entry| &entry.id).collect();
        let mut next: Vec<ScoutingEntry> = still_pending
            .into_iter()
            .filter(|entry| current_ids.contains(&entry.id))
            .collect();
        next.extend(
            current
                .iter()
                .filter(|entry| !swept_ids.contains(&entry.id))
                .cloned(),
        );
        self.cache.store(keys::PENDING_ENTRIES, &next);
    }

    /// Rewrite the pit queue after a sweep over `swept`.
    ///
    /// A pit entry upserted during the sweep supersedes a still-pending one for
    /// the same key; one removed during the sweep stays removed.
    pub async fn settle_pit_entries(
        &self,
        swept: &[PitScoutingEntry],
        still_pending: Vec<PitScoutingEntry>,
    ) {
        let _guard = self.lock.lock().await;
        let current = self.pit_entries();
        let mut next: Vec<PitScoutingEntry> = still_pending
            .into_iter()
            .filter(|entry| current.contains(entry))
            .collect();
        next.extend(current.into_iter().filter(|entry| !swept.contains(entry)));
        self.cache.store(keys::PENDING_PIT_ENTRIES, &next);
    }

    /// Drop queued entries matching `predicate`; returns how many were removed.
    pub async fn remove_entries(&self, predicate: impl Fn(&ScoutingEntry) -> bool) -> usize {
        let _guard = self.lock.lock().await;
        let mut pending = self.entries();
        let before = pending.len();
        pending.retain(|entry| !predicate(entry));
        let removed = before - pending.len();
        if removed > 0 {
            self.cache.store(keys::PENDING_ENTRIES, &pending);
        }
        removed
    }

    /// Drop queued pit entries matching `predicate`; returns how many were removed.
    pub async fn remove_pit_entries(
        &self,
        predicate: impl Fn(&PitScoutingEntry) -> bool,
    ) -> usize {
        let _guard = self.lock.lock().await;
        let mut pending = self.pit_entries();
        let before = pending.len();
        pending.retain(|entry| !predicate(entry));
        let removed = before - pending.len();
        if removed > 0 {
            self.cache.store(keys::PENDING_PIT_ENTRIES, &pending);
        }
        removed
    }
}

/// Prepend `entry` to a newest-first list, replacing any copy with the same id.
pub fn prepend_entry(list: &mut Vec<ScoutingEntry>, entry: ScoutingEntry) {
    list.retain(|existing| existing.id != entry.id);
    list.insert(0, entry);
}

/// Merge accepted pit entries into a cached list.
pub fn merge_pit_entries(list: &mut Vec<PitScoutingEntry>, accepted: Vec<PitScoutingEntry>) {
    for entry in accepted {
        upsert_pit_entry(list, entry);
    }
}

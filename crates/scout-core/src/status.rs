//! Sync status broadcaster.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::observer::{Observers, Subscription};
use crate::sync::PendingQueue;

/// What a sync indicator shows.
///
/// Derived, never stored: `pending_count` is the pending queue length at the
/// time the status was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub pending_count: usize,
    pub is_syncing: bool,
}

impl SyncStatus {
    /// Short label for status lines
    pub fn label(&self) -> String {
        match (self.is_syncing, self.pending_count) {
            (true, count) => format!("Syncing {count} pending"),
            (false, 0) => "All synced".to_string(),
            (false, count) => format!("{count} pending"),
        }
    }
}

/// Pushes `SyncStatus` to subscribers whenever the sync engine publishes.
#[derive(Debug, Clone)]
pub struct SyncStatusBroadcaster {
    queue: PendingQueue,
    observers: Observers<SyncStatus>,
    is_syncing: Arc<AtomicBool>,
}

impl SyncStatusBroadcaster {
    pub fn new(queue: PendingQueue) -> Self {
        Self {
            queue,
            observers: Observers::new(),
            is_syncing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register for future status changes.
    ///
    /// Nothing is replayed; read `current()` once for the initial state.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SyncStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Status as of now, with the last published syncing flag
    pub fn current(&self) -> SyncStatus {
        SyncStatus {
            pending_count: self.queue.len(),
            is_syncing: self.is_syncing.load(Ordering::Acquire),
        }
    }

    /// Recompute the pending count and push the status to every subscriber.
    pub fn publish(&self, is_syncing: bool) -> SyncStatus {
        self.is_syncing.store(is_syncing, Ordering::Release);
        let status = SyncStatus {
            pending_count: self.queue.len(),
            is_syncing,
        };
        tracing::debug!(
            pending = status.pending_count,
            syncing = status.is_syncing,
            "Publishing sync status"
        );
        self.observers.notify(&status);
        status
    }
}

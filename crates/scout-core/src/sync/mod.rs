//! Offline-first sync engine.
//!
//! `SyncEngine` is the single write path for scouting records. Each save makes
//! one attempt against the backend; a transient failure parks the record in
//! the persisted pending queue, and `drain` retries every parked record once,
//! in FIFO order, whenever connectivity comes back. A record leaves the queue
//! only on an explicit acceptance of that record.

mod queue;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::accessor::ReadThroughCache;
use crate::cache::{DurableCache, LocalStore, Preferences};
use crate::config::{ClientConfig, DEFAULT_SETTLE_DELAY, ENTRY_LIMIT};
use crate::error::{Error, Result};
use crate::gateway::{HttpGateway, Rejection, RejectionKind, RemoteGateway, SendOutcome};
use crate::models::{upsert_pit_entry, EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};
use crate::observer::{Observers, Subscription};
use crate::status::SyncStatusBroadcaster;

pub use queue::{merge_pit_entries, prepend_entry, PendingQueue};

/// Outcome of a save, as shown to the person scouting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResult {
    /// Stored remotely, or parked locally when `offline` is true
    Saved { offline: bool },
    /// The global entry cap (or the local buffer) is full
    LimitReached,
    /// The backend refused the record; it was not queued
    Rejected(Rejection),
}

impl SaveResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Saved { offline: true })
    }
}

/// One-shot user-facing notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Saved locally, will sync when the backend is reachable
    SavedOffline,
    LimitReached { limit: usize },
    Rejected { reason: String },
    /// A drain delivered `count` queued records
    Synced { count: usize },
}

/// Summary of one completed drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub accepted_entries: usize,
    pub accepted_pit_entries: usize,
    /// Records left in the queues once the drain settled
    pub still_pending: usize,
    /// Records the backend refused; they stay queued
    pub rejected: Vec<Rejection>,
}

impl DrainReport {
    pub const fn accepted(&self) -> usize {
        self.accepted_entries + self.accepted_pit_entries
    }
}

/// What a call to `drain` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain is in flight
    Busy,
    /// Nothing was queued
    Idle,
    /// The engine is marked offline
    Offline,
    Completed(DrainReport),
}

impl DrainOutcome {
    pub const fn report(&self) -> Option<&DrainReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Client-side coordinator for saves, retries, caches, and admin operations.
pub struct SyncEngine {
    gateway: Arc<dyn RemoteGateway>,
    queue: PendingQueue,
    status: SyncStatusBroadcaster,
    entries: ReadThroughCache<ScoutingEntry>,
    pit_entries: ReadThroughCache<PitScoutingEntry>,
    picklist: ReadThroughCache<PicklistTeam>,
    preferences: Preferences,
    notices: Observers<Notice>,
    draining: AtomicBool,
    online: AtomicBool,
    entry_limit: usize,
    settle_delay: Duration,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncEngine")
            .field("entry_limit", &self.entry_limit)
            .field("settle_delay", &self.settle_delay)
            .field("online", &self.is_online())
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Build an engine over any gateway and local store, with default limits.
    pub fn new(gateway: Arc<dyn RemoteGateway>, store: Arc<dyn LocalStore>) -> Self {
        let cache = DurableCache::new(store);
        let queue = PendingQueue::new(cache.clone());
        Self {
            status: SyncStatusBroadcaster::new(queue.clone()),
            entries: ReadThroughCache::new(Arc::clone(&gateway), cache.clone()),
            pit_entries: ReadThroughCache::new(Arc::clone(&gateway), cache.clone()),
            picklist: ReadThroughCache::new(Arc::clone(&gateway), cache.clone()),
            preferences: Preferences::new(cache),
            queue,
            gateway,
            notices: Observers::new(),
            draining: AtomicBool::new(false),
            online: AtomicBool::new(true),
            entry_limit: ENTRY_LIMIT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Build an engine talking HTTP to the backend named in `config`.
    pub fn from_config(config: &ClientConfig, store: Arc<dyn LocalStore>) -> Result<Self> {
        let gateway: Arc<dyn RemoteGateway> = Arc::new(HttpGateway::new(config)?);
        Ok(Self::new(gateway, store)
            .with_entry_limit(config.entry_limit)
            .with_settle_delay(config.settle_delay))
    }

    #[must_use]
    pub const fn with_entry_limit(mut self, entry_limit: usize) -> Self {
        self.entry_limit = entry_limit;
        self
    }

    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub const fn entry_limit(&self) -> usize {
        self.entry_limit
    }

    pub const fn status(&self) -> &SyncStatusBroadcaster {
        &self.status
    }

    pub const fn pending(&self) -> &PendingQueue {
        &self.queue
    }

    pub const fn entries(&self) -> &ReadThroughCache<ScoutingEntry> {
        &self.entries
    }

    pub const fn pit_entries(&self) -> &ReadThroughCache<PitScoutingEntry> {
        &self.pit_entries
    }

    pub const fn picklist(&self) -> &ReadThroughCache<PicklistTeam> {
        &self.picklist
    }

    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Receive one-shot notices (offline save, limit reached, sync finished).
    pub fn subscribe_notices(
        &self,
        callback: impl Fn(&Notice) + Send + Sync + 'static,
    ) -> Subscription {
        self.notices.subscribe(callback)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online != online {
            tracing::info!(online, "Connectivity changed");
        }
    }

    fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    fn publish_status(&self) {
        self.status.publish(self.is_draining());
    }

    /// Save a match entry.
    ///
    /// Confirmed plus queued entries are checked against the entry limit
    /// before any network call. A transient failure queues the entry and
    /// reports success.
    pub async fn save_entry(&self, entry: ScoutingEntry) -> SaveResult {
        let confirmed = self.entries.get().await.len();
        let queued = self.queue.entry_count();
        if confirmed + queued >= self.entry_limit {
            tracing::info!(confirmed, queued, limit = self.entry_limit, "Entry limit reached");
            return self.limit_reached();
        }

        match self.gateway.send_entry(&entry).await {
            SendOutcome::Accepted => {
                tracing::info!(entry_id = %entry.id, team = entry.team_number, "Entry saved");
                self.entries
                    .modify(|list| prepend_entry(list, entry))
                    .await;
                SaveResult::Saved { offline: false }
            }
            SendOutcome::Rejected(rejection) => self.rejected(rejection),
            SendOutcome::Unavailable(reason) => {
                tracing::info!(entry_id = %entry.id, "Backend unavailable, queueing entry: {reason}");
                if !self.queue.push_entry(entry).await {
                    tracing::debug!("Entry already queued");
                }
                self.publish_status();
                self.notices.notify(&Notice::SavedOffline);
                SaveResult::Saved { offline: true }
            }
        }
    }

    /// Save a pit entry; pit entries are keyed by team and event and have no cap.
    pub async fn save_pit_entry(&self, entry: PitScoutingEntry) -> SaveResult {
        match self.gateway.send_pit_entry(&entry).await {
            SendOutcome::Accepted => {
                tracing::info!(team = entry.team_number, "Pit entry saved");
                self.pit_entries
                    .modify(|list| upsert_pit_entry(list, entry))
                    .await;
                SaveResult::Saved { offline: false }
            }
            SendOutcome::Rejected(rejection) => {
                tracing::warn!(team = entry.team_number, "Pit entry rejected: {}", rejection.reason);
                self.notices.notify(&Notice::Rejected {
                    reason: rejection.reason.clone(),
                });
                SaveResult::Rejected(rejection)
            }
            SendOutcome::Unavailable(reason) => {
                tracing::info!(team = entry.team_number, "Backend unavailable, queueing pit entry: {reason}");
                self.queue.upsert_pit_entry(entry).await;
                self.publish_status();
                self.notices.notify(&Notice::SavedOffline);
                SaveResult::Saved { offline: true }
            }
        }
    }

    fn limit_reached(&self) -> SaveResult {
        self.notices.notify(&Notice::LimitReached {
            limit: self.entry_limit,
        });
        SaveResult::LimitReached
    }

    fn rejected(&self, rejection: Rejection) -> SaveResult {
        if rejection.kind == RejectionKind::LimitReached {
            tracing::info!("Backend reports entry limit reached");
            return self.limit_reached();
        }
        tracing::warn!(status = rejection.status, "Entry rejected: {}", rejection.reason);
        self.notices.notify(&Notice::Rejected {
            reason: rejection.reason.clone(),
        });
        SaveResult::Rejected(rejection)
    }

    /// Retry every queued record once, oldest first.
    ///
    /// Single-flight: a call made while another drain runs returns
    /// `DrainOutcome::Busy` without touching the queues.
    pub async fn drain(&self) -> DrainOutcome {
        if !self.is_online() {
            tracing::debug!("Skipping drain while offline");
            return DrainOutcome::Offline;
        }
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Drain already in progress");
            return DrainOutcome::Busy;
        }

        let outcome = self.sweep().await;
        self.draining.store(false, Ordering::Release);
        self.status.publish(false);

        if let DrainOutcome::Completed(report) = &outcome {
            if report.accepted() > 0 {
                self.notices.notify(&Notice::Synced {
                    count: report.accepted(),
                });
            }
        }
        outcome
    }

    async fn sweep(&self) -> DrainOutcome {
        let entries = self.queue.entries();
        let pit_entries = self.queue.pit_entries();
        if entries.is_empty() && pit_entries.is_empty() {
            return DrainOutcome::Idle;
        }

        tracing::info!(
            pending = entries.len() + pit_entries.len(),
            "Draining pending queue"
        );
        self.status.publish(true);
        let mut report = DrainReport::default();

        let mut accepted_entries = Vec::new();
        let mut still_pending_entries = Vec::new();
        for entry in &entries {
            match self.gateway.send_entry(entry).await {
                SendOutcome::Accepted => {
                    tracing::debug!(entry_id = %entry.id, "Queued entry delivered");
                    accepted_entries.push(entry.clone());
                }
                SendOutcome::Rejected(rejection) => {
                    tracing::warn!(entry_id = %entry.id, "Queued entry rejected: {}", rejection.reason);
                    report.rejected.push(rejection);
                    still_pending_entries.push(entry.clone());
                }
                SendOutcome::Unavailable(reason) => {
                    tracing::debug!(entry_id = %entry.id, "Queued entry still pending: {reason}");
                    still_pending_entries.push(entry.clone());
                }
            }
        }

        let mut accepted_pit = Vec::new();
        let mut still_pending_pit = Vec::new();
        for entry in &pit_entries {
            match self.gateway.send_pit_entry(entry).await {
                SendOutcome::Accepted => accepted_pit.push(entry.clone()),
                SendOutcome::Rejected(rejection) => {
                    tracing::warn!(team = entry.team_number, "Queued pit entry rejected: {}", rejection.reason);
                    report.rejected.push(rejection);
                    still_pending_pit.push(entry.clone());
                }
                SendOutcome::Unavailable(_) => still_pending_pit.push(entry.clone()),
            }
        }

        self.queue
            .settle_entries(&entries, still_pending_entries)
            .await;
        self.queue
            .settle_pit_entries(&pit_entries, still_pending_pit)
            .await;

        report.accepted_entries = accepted_entries.len();
        report.accepted_pit_entries = accepted_pit.len();
        if !accepted_entries.is_empty() {
            self.entries
                .modify(|list| {
                    for entry in accepted_entries {
                        prepend_entry(list, entry);
                    }
                })
                .await;
        }
        if !accepted_pit.is_empty() {
            self.pit_entries
                .modify(|list| merge_pit_entries(list, accepted_pit))
                .await;
        }

        report.still_pending = self.queue.len();
        tracing::info!(
            accepted = report.accepted(),
            pending = report.still_pending,
            "Drain finished"
        );
        DrainOutcome::Completed(report)
    }

    /// Process-start trigger: pick up the backend's event key, then drain.
    pub async fn start(&self) -> DrainOutcome {
        self.refresh_event_key().await;
        self.drain().await
    }

    /// Connectivity-restored trigger.
    ///
    /// Waits the settle delay so the link can stabilise before the drain.
    pub async fn connectivity_restored(&self) -> DrainOutcome {
        self.set_online(true);
        tokio::time::sleep(self.settle_delay).await;
        self.refresh_event_key().await;
        self.drain().await
    }

    /// Adopt the backend's event key; keeps the cached key when unreachable.
    pub async fn refresh_event_key(&self) -> String {
        match self.gateway.fetch_event_key().await {
            Ok(key) => {
                self.preferences.set_event_key(&key);
                key
            }
            Err(error) => {
                tracing::warn!("Could not refresh event key: {error}");
                self.preferences.event_key()
            }
        }
    }

    pub async fn update_event_key(&self, event_key: &str, password: &str) -> Result<()> {
        let event_key = event_key.trim();
        if event_key.is_empty() {
            return Err(Error::InvalidInput("event key is required".into()));
        }
        self.gateway.update_event_key(event_key, password).await?;
        self.preferences.set_event_key(event_key);
        tracing::info!(event_key, "Event key updated");
        Ok(())
    }

    /// Delete one entry remotely, then from the local cache and queue.
    pub async fn delete_entry(&self, id: &EntryId, password: &str) -> Result<()> {
        self.gateway.delete_entry(id, password).await?;
        self.forget_entries(|entry| &entry.id == id).await;
        Ok(())
    }

    pub async fn delete_entries(&self, ids: &[EntryId], password: &str) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.gateway.delete_entries(ids, password).await?;
        self.forget_entries(|entry| ids.contains(&entry.id)).await;
        Ok(())
    }

    /// Delete every match and pit entry of the given teams.
    ///
    /// Both remote deletes are attempted. Local data is dropped for each side
    /// the backend confirmed, and the first failure is returned.
    pub async fn delete_teams(&self, team_numbers: &[u32], password: &str) -> Result<()> {
        if team_numbers.is_empty() {
            return Ok(());
        }
        let entries_deleted = self
            .gateway
            .delete_team_entries(team_numbers, password)
            .await;
        let pit_deleted = self
            .gateway
            .delete_team_pit_entries(team_numbers, password)
            .await;

        if entries_deleted.is_ok() {
            self.forget_entries(|entry| team_numbers.contains(&entry.team_number))
                .await;
        }
        if pit_deleted.is_ok() {
            self.pit_entries
                .modify(|list| list.retain(|entry| !team_numbers.contains(&entry.team_number)))
                .await;
            let removed = self
                .queue
                .remove_pit_entries(|entry| team_numbers.contains(&entry.team_number))
                .await;
            if removed > 0 {
                self.publish_status();
            }
        }

        match (entries_deleted, pit_deleted) {
            (Ok(()), Ok(())) => {
                tracing::info!(teams = ?team_numbers, "Deleted team data");
                Ok(())
            }
            (Err(error), _) | (Ok(()), Err(error)) => {
                tracing::warn!(teams = ?team_numbers, "Team delete incomplete: {error}");
                Err(error.into())
            }
        }
    }

    async fn forget_entries(&self, predicate: impl Fn(&ScoutingEntry) -> bool) {
        self.entries
            .modify(|list| list.retain(|entry| !predicate(entry)))
            .await;
        if self.queue.remove_entries(&predicate).await > 0 {
            self.publish_status();
        }
    }

    /// Replace the whole picklist; online only.
    pub async fn save_picklist(&self, picklist: Vec<PicklistTeam>) -> Result<()> {
        self.gateway.replace_picklist(&picklist).await?;
        self.picklist.replace(picklist).await;
        Ok(())
    }

    /// Append a team at the end of the picklist; online only.
    pub async fn add_to_picklist(&self, team_number: u32) -> Result<Vec<PicklistTeam>> {
        self.gateway.add_picklist_team(team_number).await?;
        let picklist = match self.picklist.refresh().await {
            Some(picklist) => picklist,
            None => self.picklist.snapshot().unwrap_or_default(),
        };
        Ok(picklist)
    }

    pub async fn remove_from_picklist(&self, team_number: u32, password: &str) -> Result<()> {
        self.gateway
            .remove_picklist_team(team_number, password)
            .await?;
        self.picklist
            .modify(|list| list.retain(|team| team.team_number != team_number))
            .await;
        Ok(())
    }

    /// Match entries for one team straight from the backend; empty when unreachable.
    pub async fn entries_for_team(&self, team_number: u32) -> Vec<ScoutingEntry> {
        match self.gateway.fetch_team_entries(team_number).await {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(team = team_number, "Could not fetch team entries: {error}");
                Vec::new()
            }
        }
    }

    /// Pit entry for one team, falling back to queued and cached copies.
    pub async fn pit_entry_for_team(&self, team_number: u32) -> Option<PitScoutingEntry> {
        match self.gateway.fetch_team_pit_entry(team_number).await {
            Ok(Some(entry)) => return Some(entry),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(team = team_number, "Could not fetch pit entry: {error}");
            }
        }
        self.queue
            .pit_entries()
            .into_iter()
            .rev()
            .find(|entry| entry.team_number == team_number)
            .or_else(|| {
                self.pit_entries
                    .snapshot()
                    .unwrap_or_default()
                    .into_iter()
                    .find(|entry| entry.team_number == team_number)
            })
    }
}

#[cfg(test)]
mod tests;

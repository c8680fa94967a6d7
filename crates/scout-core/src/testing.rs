//! In-memory `RemoteGateway` used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::gateway::{GatewayError, GatewayResult, RemoteGateway, SendOutcome};
use crate::models::{upsert_pit_entry, EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};

pub const ADMIN_PASSWORD: &str = "letmein";

#[derive(Default)]
struct State {
    offline: bool,
    entry_limit: Option<usize>,
    entries: Vec<ScoutingEntry>,
    pit: Vec<PitScoutingEntry>,
    picklist: Vec<PicklistTeam>,
    event_key: Option<String>,
    scripted: VecDeque<SendOutcome>,
    rejected_ids: HashMap<EntryId, u16>,
    attempts: Vec<EntryId>,
    pause: Option<Arc<Notify>>,
    pit_delete_status: Option<u16>,
}

/// Scriptable stand-in for the Scout backend.
///
/// Behaves like the real server (upsert by id, optional entry cap) unless it
/// is switched offline or has scripted outcomes queued.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_online(&self, online: bool) {
        self.state().offline = !online;
    }

    pub fn set_entry_limit(&self, limit: usize) {
        self.state().entry_limit = Some(limit);
    }

    pub fn set_remote_entries(&self, entries: Vec<ScoutingEntry>) {
        self.state().entries = entries;
    }

    pub fn set_remote_picklist(&self, picklist: Vec<PicklistTeam>) {
        self.state().picklist = picklist;
    }

    pub fn set_event_key(&self, key: &str) {
        self.state().event_key = Some(key.to_string());
    }

    /// Answer the next send with `outcome`, whatever the gateway state.
    pub fn push_outcome(&self, outcome: SendOutcome) {
        self.state().scripted.push_back(outcome);
    }

    /// Reject every send of `id` with `status`.
    pub fn reject_entry(&self, id: &EntryId, status: u16) {
        self.state().rejected_ids.insert(id.clone(), status);
    }

    /// Fail every pit delete with `status`.
    pub fn fail_pit_deletes(&self, status: u16) {
        self.state().pit_delete_status = Some(status);
    }

    /// Hold the next send until the returned handle is notified.
    pub fn pause_next_send(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state().pause = Some(Arc::clone(&notify));
        notify
    }

    pub fn remote_entries(&self) -> Vec<ScoutingEntry> {
        self.state().entries.clone()
    }

    pub fn remote_pit_entries(&self) -> Vec<PitScoutingEntry> {
        self.state().pit.clone()
    }

    pub fn remote_picklist(&self) -> Vec<PicklistTeam> {
        self.state().picklist.clone()
    }

    /// Ids of every attempted entry send, in order
    pub fn attempts(&self) -> Vec<EntryId> {
        self.state().attempts.clone()
    }

    fn unavailable(&self) -> GatewayResult<()> {
        if self.state().offline {
            Err(GatewayError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn authorize(&self, password: &str) -> GatewayResult<()> {
        self.unavailable()?;
        if password == ADMIN_PASSWORD {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn send_entry(&self, entry: &ScoutingEntry) -> SendOutcome {
        let pause = {
            let mut state = self.state();
            state.attempts.push(entry.id.clone());
            state.pause.take()
        };
        if let Some(pause) = pause {
            pause.notified().await;
        }

        let mut state = self.state();
        if let Some(outcome) = state.scripted.pop_front() {
            if outcome == SendOutcome::Accepted {
                state.entries.retain(|existing| existing.id != entry.id);
                state.entries.insert(0, entry.clone());
            }
            return outcome;
        }
        if state.offline {
            return SendOutcome::Unavailable("connection refused".to_string());
        }
        if let Some(status) = state.rejected_ids.get(&entry.id) {
            return SendOutcome::from_status(*status, "rejected by test");
        }
        let exists = state.entries.iter().any(|existing| existing.id == entry.id);
        if !exists && state.entry_limit.is_some_and(|limit| state.entries.len() >= limit) {
            return SendOutcome::from_status(403, "Entry limit reached");
        }
        state.entries.retain(|existing| existing.id != entry.id);
        state.entries.insert(0, entry.clone());
        SendOutcome::Accepted
    }

    async fn send_pit_entry(&self, entry: &PitScoutingEntry) -> SendOutcome {
        let mut state = self.state();
        if let Some(outcome) = state.scripted.pop_front() {
            return outcome;
        }
        if state.offline {
            return SendOutcome::Unavailable("connection refused".to_string());
        }
        upsert_pit_entry(&mut state.pit, entry.clone());
        SendOutcome::Accepted
    }

    async fn fetch_entries(&self) -> GatewayResult<Vec<ScoutingEntry>> {
        self.unavailable()?;
        Ok(self.remote_entries())
    }

    async fn fetch_team_entries(&self, team_number: u32) -> GatewayResult<Vec<ScoutingEntry>> {
        self.unavailable()?;
        Ok(self
            .remote_entries()
            .into_iter()
            .filter(|entry| entry.team_number == team_number)
            .collect())
    }

    async fn delete_entry(&self, id: &EntryId, password: &str) -> GatewayResult<()> {
        self.authorize(password)?;
        self.state().entries.retain(|entry| &entry.id != id);
        Ok(())
    }

    async fn delete_entries(&self, ids: &[EntryId], password: &str) -> GatewayResult<()> {
        self.authorize(password)?;
        self.state().entries.retain(|entry| !ids.contains(&entry.id));
        Ok(())
    }

    async fn delete_team_entries(
        &self,
        team_numbers: &[u32],
        password: &str,
    ) -> GatewayResult<()> {
        self.authorize(password)?;
        self.state()
            .entries
            .retain(|entry| !team_numbers.contains(&entry.team_number));
        Ok(())
    }

    async fn fetch_pit_entries(&self) -> GatewayResult<Vec<PitScoutingEntry>> {
        self.unavailable()?;
        Ok(self.remote_pit_entries())
    }

    async fn fetch_team_pit_entry(
        &self,
        team_number: u32,
    ) -> GatewayResult<Option<PitScoutingEntry>> {
        self.unavailable()?;
        Ok(self
            .remote_pit_entries()
            .into_iter()
            .find(|entry| entry.team_number == team_number))
    }

    async fn delete_team_pit_entries(
        &self,
        team_numbers: &[u32],
        password: &str,
    ) -> GatewayResult<()> {
        self.authorize(password)?;
        let mut state = self.state();
        if let Some(status) = state.pit_delete_status {
            return Err(GatewayError::Status {
                status,
                message: "pit store locked".to_string(),
            });
        }
        state
            .pit
            .retain(|entry| !team_numbers.contains(&entry.team_number));
        Ok(())
    }

    async fn fetch_picklist(&self) -> GatewayResult<Vec<PicklistTeam>> {
        self.unavailable()?;
        Ok(self.remote_picklist())
    }

    async fn replace_picklist(&self, picklist: &[PicklistTeam]) -> GatewayResult<()> {
        self.unavailable()?;
        self.state().picklist = picklist.to_vec();
        Ok(())
    }

    async fn add_picklist_team(&self, team_number: u32) -> GatewayResult<()> {
        self.unavailable()?;
        let mut state = self.state();
        if !state.picklist.iter().any(|team| team.team_number == team_number) {
            let rank = state.picklist.iter().map(|team| team.rank).max().unwrap_or(0) + 1;
            state.picklist.push(PicklistTeam::new(team_number, rank));
        }
        Ok(())
    }

    async fn remove_picklist_team(&self, team_number: u32, password: &str) -> GatewayResult<()> {
        self.authorize(password)?;
        self.state()
            .picklist
            .retain(|team| team.team_number != team_number);
        Ok(())
    }

    async fn fetch_event_key(&self) -> GatewayResult<String> {
        self.unavailable()?;
        self.state().event_key.clone().ok_or(GatewayError::NotFound)
    }

    async fn update_event_key(&self, event_key: &str, password: &str) -> GatewayResult<()> {
        self.authorize(password)?;
        self.state().event_key = Some(event_key.to_string());
        Ok(())
    }
}

//! SQLite persistence for the API server.
//!
//! Entries and pit entries are stored as JSON payloads next to the columns
//! used for lookups and ordering, so payload fields can evolve without
//! migrations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension, Params};
use scout_core::{EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};
use serde::de::DeserializeOwned;
use thiserror::Error;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS scouting_entries (
    id TEXT PRIMARY KEY,
    team_number INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    payload TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entries_team ON scouting_entries(team_number);

CREATE TABLE IF NOT EXISTS pit_scouting (
    team_number INTEGER NOT NULL,
    event TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    payload TEXT NOT NULL,
    PRIMARY KEY (team_number, event)
);

CREATE TABLE IF NOT EXISTS picklist (
    team_number INTEGER PRIMARY KEY,
    rank INTEGER NOT NULL,
    manual_override INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS app_config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
";

const ACTIVE_EVENT_KEY: &str = "active_event_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored payload is invalid: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Entry limit of {limit} reached")]
    LimitReached { limit: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whether an entry write created a row or replaced one with the same id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryWrite {
    Created,
    Replaced,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open the database at `path` (`:memory:` for a throwaway store) and apply the schema.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn payloads<T: DeserializeOwned>(&self, sql: &str, params: impl Params) -> StoreResult<Vec<T>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut values = Vec::new();
        for payload in rows {
            values.push(serde_json::from_str(&payload?)?);
        }
        Ok(values)
    }

    /// Every entry, newest first
    pub fn entries(&self) -> StoreResult<Vec<ScoutingEntry>> {
        self.payloads(
            "SELECT payload FROM scouting_entries ORDER BY timestamp DESC, rowid DESC",
            [],
        )
    }

    pub fn team_entries(&self, team_number: u32) -> StoreResult<Vec<ScoutingEntry>> {
        self.payloads(
            "SELECT payload FROM scouting_entries WHERE team_number = ?1
             ORDER BY timestamp DESC, rowid DESC",
            params![team_number],
        )
    }

    pub fn entry_count(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM scouting_entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Insert an entry, or replace the stored entry with the same id.
    ///
    /// The cap applies to new ids only, and is checked inside the same
    /// transaction as the insert.
    pub fn put_entry(&self, entry: &ScoutingEntry, limit: usize) -> StoreResult<EntryWrite> {
        let payload = serde_json::to_string(entry)?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM scouting_entries WHERE id = ?1",
                params![entry.id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if exists {
            tx.execute(
                "UPDATE scouting_entries SET team_number = ?2, timestamp = ?3, payload = ?4
                 WHERE id = ?1",
                params![entry.id.as_str(), entry.team_number, entry.timestamp, payload],
            )?;
            tx.commit()?;
            return Ok(EntryWrite::Replaced);
        }

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM scouting_entries", [], |row| row.get(0))?;
        if usize::try_from(count).unwrap_or(usize::MAX) >= limit {
            return Err(StoreError::LimitReached { limit });
        }
        tx.execute(
            "INSERT INTO scouting_entries (id, team_number, timestamp, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.id.as_str(), entry.team_number, entry.timestamp, payload],
        )?;
        tx.commit()?;
        Ok(EntryWrite::Created)
    }

    pub fn delete_entries(&self, ids: &[EntryId]) -> StoreResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for id in ids {
            removed += tx.execute(
                "DELETE FROM scouting_entries WHERE id = ?1",
                params![id.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    pub fn delete_team_entries(&self, team_numbers: &[u32]) -> StoreResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for team in team_numbers {
            removed += tx.execute(
                "DELETE FROM scouting_entries WHERE team_number = ?1",
                params![team],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Every pit entry, newest first
    pub fn pit_entries(&self) -> StoreResult<Vec<PitScoutingEntry>> {
        self.payloads(
            "SELECT payload FROM pit_scouting ORDER BY timestamp DESC",
            [],
        )
    }

    /// Most recent pit entry for a team, across events
    pub fn team_pit_entry(&self, team_number: u32) -> StoreResult<Option<PitScoutingEntry>> {
        let mut entries = self.payloads(
            "SELECT payload FROM pit_scouting WHERE team_number = ?1
             ORDER BY timestamp DESC LIMIT 1",
            params![team_number],
        )?;
        Ok(entries.pop())
    }

    /// Insert or replace the pit entry for `(team_number, event)`.
    pub fn put_pit_entry(&self, entry: &PitScoutingEntry) -> StoreResult<()> {
        let payload = serde_json::to_string(entry)?;
        self.conn().execute(
            "INSERT INTO pit_scouting (team_number, event, timestamp, payload)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(team_number, event) DO UPDATE SET
                timestamp = excluded.timestamp,
                payload = excluded.payload",
            params![entry.team_number, entry.event, entry.timestamp, payload],
        )?;
        Ok(())
    }

    pub fn delete_team_pit_entries(&self, team_numbers: &[u32]) -> StoreResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for team in team_numbers {
            removed += tx.execute(
                "DELETE FROM pit_scouting WHERE team_number = ?1",
                params![team],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// The picklist ordered by rank
    pub fn picklist(&self) -> StoreResult<Vec<PicklistTeam>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT team_number, rank, manual_override FROM picklist ORDER BY rank ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(PicklistTeam {
                team_number: row.get(0)?,
                rank: row.get(1)?,
                manual_override: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Replace the whole picklist atomically.
    pub fn replace_picklist(&self, picklist: &[PicklistTeam]) -> StoreResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM picklist", [])?;
        for team in picklist {
            tx.execute(
                "INSERT INTO picklist (team_number, rank, manual_override) VALUES (?1, ?2, ?3)",
                params![team.team_number, team.rank, team.manual_override],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert or update one picklist row; without a rank the team goes last.
    pub fn put_picklist_team(
        &self,
        team_number: u32,
        rank: Option<u32>,
        manual_override: bool,
    ) -> StoreResult<PicklistTeam> {
        let conn = self.conn();
        let rank = match rank {
            Some(rank) => rank,
            None => conn.query_row(
                "SELECT COALESCE(MAX(rank), 0) + 1 FROM picklist",
                [],
                |row| row.get(0),
            )?,
        };
        conn.execute(
            "INSERT INTO picklist (team_number, rank, manual_override) VALUES (?1, ?2, ?3)
             ON CONFLICT(team_number) DO UPDATE SET
                rank = excluded.rank,
                manual_override = excluded.manual_override",
            params![team_number, rank, manual_override],
        )?;
        Ok(PicklistTeam {
            team_number,
            rank,
            manual_override,
        })
    }

    pub fn remove_picklist_team(&self, team_number: u32) -> StoreResult<usize> {
        Ok(self.conn().execute(
            "DELETE FROM picklist WHERE team_number = ?1",
            params![team_number],
        )?)
    }

    pub fn event_key(&self) -> StoreResult<Option<String>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT value FROM app_config WHERE key = ?1",
                params![ACTIVE_EVENT_KEY],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_event_key(&self, event_key: &str) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO app_config (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![ACTIVE_EVENT_KEY, event_key, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> Store {
        Store::open(":memory:").unwrap()
    }

    #[test]
    fn put_entry_is_idempotent_by_id() {
        let store = store();
        let entry = ScoutingEntry::new("2026cahal", 1, 2473);
        assert_eq!(store.put_entry(&entry, 10).unwrap(), EntryWrite::Created);
        assert_eq!(store.put_entry(&entry, 10).unwrap(), EntryWrite::Replaced);
        assert_eq!(store.entry_count().unwrap(), 1);
    }

    #[test]
    fn put_entry_enforces_limit_for_new_ids_only() {
        let store = store();
        let first = ScoutingEntry::new("2026cahal", 1, 1);
        store.put_entry(&first, 1).unwrap();

        let err = store
            .put_entry(&ScoutingEntry::new("2026cahal", 2, 2), 1)
            .unwrap_err();
        assert!(matches!(err, StoreError::LimitReached { limit: 1 }));
        assert_eq!(store.put_entry(&first, 1).unwrap(), EntryWrite::Replaced);
    }

    #[test]
    fn entries_are_newest_first_and_filterable_by_team() {
        let store = store();
        let mut older = ScoutingEntry::new("2026cahal", 1, 254);
        older.timestamp = 1_000;
        let mut newer = ScoutingEntry::new("2026cahal", 2, 971);
        newer.timestamp = 2_000;
        store.put_entry(&older, 10).unwrap();
        store.put_entry(&newer, 10).unwrap();

        let all: Vec<u32> = store
            .entries()
            .unwrap()
            .iter()
            .map(|entry| entry.match_number)
            .collect();
        assert_eq!(all, vec![2, 1]);
        assert_eq!(store.team_entries(254).unwrap(), vec![older]);
    }

    #[test]
    fn pit_entries_upsert_by_team_and_event() {
        let store = store();
        let mut entry = PitScoutingEntry::new("2026cahal", 254);
        store.put_pit_entry(&entry).unwrap();
        entry.max_balls = 20;
        store.put_pit_entry(&entry).unwrap();
        store
            .put_pit_entry(&PitScoutingEntry::new("2026casj", 254))
            .unwrap();

        assert_eq!(store.pit_entries().unwrap().len(), 2);
        assert_eq!(store.delete_team_pit_entries(&[254]).unwrap(), 2);
        assert_eq!(store.team_pit_entry(254).unwrap(), None);
    }

    #[test]
    fn picklist_replace_and_append() {
        let store = store();
        store
            .replace_picklist(&[PicklistTeam::new(971, 2), PicklistTeam::new(254, 1)])
            .unwrap();
        let appended = store.put_picklist_team(1678, None, false).unwrap();
        assert_eq!(appended.rank, 3);

        let order: Vec<u32> = store
            .picklist()
            .unwrap()
            .iter()
            .map(|team| team.team_number)
            .collect();
        assert_eq!(order, vec![254, 971, 1678]);
    }

    #[test]
    fn event_key_round_trips() {
        let store = store();
        assert_eq!(store.event_key().unwrap(), None);
        store.set_event_key("2026casf").unwrap();
        store.set_event_key("2026casj").unwrap();
        assert_eq!(store.event_key().unwrap().as_deref(), Some("2026casj"));
    }

    #[test]
    fn file_database_persists_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.db");
        let entry = ScoutingEntry::new("2026cahal", 4, 1678);
        {
            let store = Store::open(path.to_str().unwrap()).unwrap();
            store.put_entry(&entry, 10).unwrap();
        }
        let reopened = Store::open(path.to_str().unwrap()).unwrap();
        assert_eq!(reopened.entries().unwrap(), vec![entry]);
    }
}

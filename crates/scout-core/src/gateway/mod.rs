//! Remote gateway: the boundary between clients and the Scout backend.
//!
//! Writes of scouting records are classified into exactly three outcomes.
//! Conflating `Rejected` with `Unavailable` would either queue records the
//! server will never accept or drop records that only hit a network blip, so
//! the classification lives here, in one place. The gateway never retries.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};

pub use http::HttpGateway;

/// Why the remote refused a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The global entry cap was reached (HTTP 403)
    LimitReached,
    /// The admin secret did not match (HTTP 401)
    Unauthorized,
    /// Any other client-side error: validation, malformed payload
    Invalid,
}

/// A definitive refusal. Never retried, never queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub status: u16,
    pub reason: String,
}

impl Rejection {
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let kind = match status {
            401 => RejectionKind::Unauthorized,
            403 => RejectionKind::LimitReached,
            _ => RejectionKind::Invalid,
        };
        Self {
            kind,
            status,
            reason: reason.into(),
        }
    }
}

/// Result of sending one record to the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Remote answered 2xx
    Accepted,
    /// Remote answered 4xx
    Rejected(Rejection),
    /// Remote answered 5xx, or never answered
    Unavailable(String),
}

impl SendOutcome {
    /// Classify an HTTP status code with its decoded error message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            200..=299 => Self::Accepted,
            400..=499 => Self::Rejected(Rejection::from_status(status, message)),
            _ => Self::Unavailable(message.into()),
        }
    }
}

/// Errors from gateway reads and admin operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Unauthorized: admin password rejected")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Remote store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Operations the client needs from the Scout backend.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// `POST /entries`
    async fn send_entry(&self, entry: &ScoutingEntry) -> SendOutcome;

    /// `POST /pit`
    async fn send_pit_entry(&self, entry: &PitScoutingEntry) -> SendOutcome;

    /// `GET /entries`
    async fn fetch_entries(&self) -> GatewayResult<Vec<ScoutingEntry>>;

    /// `GET /entries/team/{team}`
    async fn fetch_team_entries(&self, team_number: u32) -> GatewayResult<Vec<ScoutingEntry>>;

    /// `DELETE /entries/{id}`
    async fn delete_entry(&self, id: &EntryId, password: &str) -> GatewayResult<()>;

    /// `POST /entries/delete-batch`
    async fn delete_entries(&self, ids: &[EntryId], password: &str) -> GatewayResult<()>;

    /// `POST /entries/delete-batch-teams`
    async fn delete_team_entries(&self, team_numbers: &[u32], password: &str)
        -> GatewayResult<()>;

    /// `GET /pit`
    async fn fetch_pit_entries(&self) -> GatewayResult<Vec<PitScoutingEntry>>;

    /// `GET /pit/team/{team}`; `Ok(None)` when the backend has no record
    async fn fetch_team_pit_entry(&self, team_number: u32)
        -> GatewayResult<Option<PitScoutingEntry>>;

    /// `POST /pit/delete-batch-teams`
    async fn delete_team_pit_entries(
        &self,
        team_numbers: &[u32],
        password: &str,
    ) -> GatewayResult<()>;

    /// `GET /picklist`
    async fn fetch_picklist(&self) -> GatewayResult<Vec<PicklistTeam>>;

    /// `PUT /picklist`
    async fn replace_picklist(&self, picklist: &[PicklistTeam]) -> GatewayResult<()>;

    /// `POST /picklist`, appended after the current last rank
    async fn add_picklist_team(&self, team_number: u32) -> GatewayResult<()>;

    /// `DELETE /picklist/{team}`
    async fn remove_picklist_team(&self, team_number: u32, password: &str) -> GatewayResult<()>;

    /// `GET /config/event-key`
    async fn fetch_event_key(&self) -> GatewayResult<String>;

    /// `POST /config/event-key`
    async fn update_event_key(&self, event_key: &str, password: &str) -> GatewayResult<()>;
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use scout_core::{EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::{EntryWrite, Store, StoreResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<Store>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Store) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    /// Open the configured database and build the state around it.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AppError> {
        let store = Store::open(&config.database_path)
            .map_err(|error| AppError::Config(format!("cannot open database: {error}")))?;
        Ok(Self::new(config, store))
    }

    fn authorize(&self, password: &str) -> Result<(), AppError> {
        if password == self.config.admin_password {
            Ok(())
        } else {
            tracing::warn!("Rejected admin request with wrong password");
            Err(AppError::Unauthorized)
        }
    }

    /// Run a store call on the blocking pool so SQLite I/O never stalls the
    /// async workers.
    async fn db<T, F>(&self, call: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || call(&store))
            .await
            .map_err(|error| AppError::internal(format!("store task failed: {error}")))?
            .map_err(AppError::from)
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/entries", get(list_entries).post(create_entry))
        .route(
            "/entries/team/{team_number}",
            get(team_entries).delete(delete_team_entries),
        )
        .route("/entries/delete-batch", post(delete_entry_batch))
        .route("/entries/delete-batch-teams", post(delete_team_batch))
        .route("/entries/{id}", delete(delete_entry))
        .route("/pit", get(list_pit_entries).post(upsert_pit_entry))
        .route("/pit/team/{team_number}", get(team_pit_entry))
        .route("/pit/delete-batch-teams", post(delete_pit_team_batch))
        .route(
            "/picklist",
            get(get_picklist).put(replace_picklist).post(add_picklist_team),
        )
        .route("/picklist/{team_number}", delete(remove_picklist_team))
        .route("/config/event-key", get(get_event_key).post(set_event_key))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
    entries: usize,
    entry_limit: usize,
}

async fn healthz(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
        entries: state.db(Store::entry_count).await?,
        entry_limit: state.config.entry_limit,
    }))
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<EntryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<usize>,
}

impl SuccessResponse {
    const fn ok() -> Self {
        Self {
            success: true,
            id: None,
            removed: None,
        }
    }

    const fn removed(count: usize) -> Self {
        Self {
            success: true,
            id: None,
            removed: Some(count),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PasswordRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct DeleteIdsRequest {
    #[serde(default)]
    ids: Vec<EntryId>,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTeamsRequest {
    #[serde(default)]
    team_numbers: Vec<u32>,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPicklistRequest {
    team_number: u32,
    rank: Option<u32>,
    #[serde(default)]
    manual_override: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetEventKeyRequest {
    #[serde(default)]
    event_key: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventKeyResponse {
    event_key: String,
}

async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<ScoutingEntry>>, AppError> {
    Ok(Json(state.db(Store::entries).await?))
}

async fn team_entries(
    State(state): State<AppState>,
    Path(team_number): Path<u32>,
) -> Result<Json<Vec<ScoutingEntry>>, AppError> {
    Ok(Json(
        state
            .db(move |store| store.team_entries(team_number))
            .await?,
    ))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(entry): Json<ScoutingEntry>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    entry
        .validate()
        .map_err(|error| AppError::bad_request(error.to_string()))?;

    let limit = state.config.entry_limit;
    let stored = entry.clone();
    let write = state
        .db(move |store| store.put_entry(&stored, limit))
        .await?;
    let status = match write {
        EntryWrite::Created => {
            tracing::info!(entry_id = %entry.id, team = entry.team_number, "Stored entry");
            StatusCode::CREATED
        }
        EntryWrite::Replaced => {
            tracing::info!(entry_id = %entry.id, "Entry re-sent, replaced stored copy");
            StatusCode::OK
        }
    };
    Ok((
        status,
        Json(SuccessResponse {
            id: Some(entry.id),
            ..SuccessResponse::ok()
        }),
    ))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    let ids = [EntryId::from(id)];
    let removed = state.db(move |store| store.delete_entries(&ids)).await?;
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn delete_entry_batch(
    State(state): State<AppState>,
    Json(request): Json<DeleteIdsRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    if request.ids.is_empty() {
        return Err(AppError::bad_request("ids must not be empty"));
    }
    let removed = state
        .db(move |store| store.delete_entries(&request.ids))
        .await?;
    tracing::info!(removed, "Deleted entries by id");
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn delete_team_entries(
    State(state): State<AppState>,
    Path(team_number): Path<u32>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    let removed = state
        .db(move |store| store.delete_team_entries(&[team_number]))
        .await?;
    tracing::info!(team = team_number, removed, "Deleted team entries");
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn delete_team_batch(
    State(state): State<AppState>,
    Json(request): Json<DeleteTeamsRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    if request.team_numbers.is_empty() {
        return Err(AppError::bad_request("teamNumbers must not be empty"));
    }
    let teams = request.team_numbers;
    let removed = state
        .db({
            let teams = teams.clone();
            move |store| store.delete_team_entries(&teams)
        })
        .await?;
    tracing::info!(?teams, removed, "Deleted entries for teams");
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn list_pit_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<PitScoutingEntry>>, AppError> {
    Ok(Json(state.db(Store::pit_entries).await?))
}

async fn team_pit_entry(
    State(state): State<AppState>,
    Path(team_number): Path<u32>,
) -> Result<Json<PitScoutingEntry>, AppError> {
    state
        .db(move |store| store.team_pit_entry(team_number))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Pit entry not found"))
}

async fn upsert_pit_entry(
    State(state): State<AppState>,
    Json(mut entry): Json<PitScoutingEntry>,
) -> Result<Json<SuccessResponse>, AppError> {
    if entry.team_number == 0 {
        return Err(AppError::bad_request("teamNumber must be positive"));
    }
    if entry.event.trim().is_empty() {
        entry.event = state
            .db(Store::event_key)
            .await?
            .unwrap_or_else(|| state.config.default_event_key.clone());
    }
    let stored = entry.clone();
    state.db(move |store| store.put_pit_entry(&stored)).await?;
    tracing::info!(team = entry.team_number, event = %entry.event, "Stored pit entry");
    Ok(Json(SuccessResponse::ok()))
}

async fn delete_pit_team_batch(
    State(state): State<AppState>,
    Json(request): Json<DeleteTeamsRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    let removed = state
        .db(move |store| store.delete_team_pit_entries(&request.team_numbers))
        .await?;
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn get_picklist(State(state): State<AppState>) -> Result<Json<Vec<PicklistTeam>>, AppError> {
    Ok(Json(state.db(Store::picklist).await?))
}

async fn replace_picklist(
    State(state): State<AppState>,
    Json(picklist): Json<Vec<PicklistTeam>>,
) -> Result<Json<SuccessResponse>, AppError> {
    let teams = picklist.len();
    state
        .db(move |store| store.replace_picklist(&picklist))
        .await?;
    tracing::info!(teams, "Replaced picklist");
    Ok(Json(SuccessResponse::ok()))
}

async fn add_picklist_team(
    State(state): State<AppState>,
    Json(request): Json<AddPicklistRequest>,
) -> Result<(StatusCode, Json<PicklistTeam>), AppError> {
    let team = state
        .db(move |store| {
            store.put_picklist_team(request.team_number, request.rank, request.manual_override)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn remove_picklist_team(
    State(state): State<AppState>,
    Path(team_number): Path<u32>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.authorize(&request.password)?;
    let removed = state
        .db(move |store| store.remove_picklist_team(team_number))
        .await?;
    Ok(Json(SuccessResponse::removed(removed)))
}

async fn get_event_key(State(state): State<AppState>) -> Result<Json<EventKeyResponse>, AppError> {
    let event_key = state
        .db(Store::event_key)
        .await?
        .unwrap_or_else(|| state.config.default_event_key.clone());
    Ok(Json(EventKeyResponse { event_key }))
}

async fn set_event_key(
    State(state): State<AppState>,
    Json(request): Json<SetEventKeyRequest>,
) -> Result<Json<EventKeyResponse>, AppError> {
    state.authorize(&request.password)?;
    let event_key = request.event_key.trim().to_string();
    if event_key.is_empty() {
        return Err(AppError::bad_request("eventKey is required"));
    }
    let stored = event_key.clone();
    state.db(move |store| store.set_event_key(&stored)).await?;
    tracing::info!(%event_key, "Active event key changed");
    Ok(Json(EventKeyResponse { event_key }))
}

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use scout_core::accessor::{ReadThroughCache, RemoteCollection};
use scout_core::cache::FileStore;
use scout_core::config::ClientConfig;
use scout_core::gateway::RejectionKind;
use scout_core::stats::TeamStats;
use scout_core::{DrainOutcome, EntryId, PicklistTeam, SaveResult, ScoutingEntry, SyncEngine};
use serde::Serialize;

use crate::error::CliError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3001";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListItem {
    pub id: String,
    pub event: String,
    pub match_number: u32,
    pub team_number: u32,
    pub scout_name: Option<String>,
    pub timestamp: i64,
    pub relative_time: String,
    pub score: u32,
    pub pending: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistItem {
    pub rank: u32,
    pub team_number: u32,
    pub manual_override: bool,
    pub total_score: Option<f64>,
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os("SCOUT_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from(".scout"), |dir| dir.join("scout"))
}

/// Build the client configuration, letting `--api-url` win over `SCOUT_API_URL`.
pub fn resolve_client_config(
    cli_api_url: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, CliError> {
    let api_url = cli_api_url
        .or_else(|| lookup("SCOUT_API_URL"))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let config = ClientConfig::from_lookup(|name| {
        if name == "SCOUT_API_URL" {
            Some(api_url.clone())
        } else {
            lookup(name)
        }
    })?;
    Ok(config)
}

/// Open the engine over the local cache and run the startup drain.
pub async fn open_engine(
    config: &ClientConfig,
    data_dir: &Path,
) -> Result<(SyncEngine, DrainOutcome), CliError> {
    let store = FileStore::open(data_dir)?;
    let engine = SyncEngine::from_config(config, Arc::new(store))?;
    let startup = engine.start().await;
    if let Some(report) = startup.report() {
        if report.accepted() > 0 {
            eprintln!("Synced {} queued record(s)", report.accepted());
        }
    }
    Ok((engine, startup))
}

/// Fetch a collection from the backend, falling back to the cached snapshot.
pub async fn load_collection<C: RemoteCollection>(cache: &ReadThroughCache<C>) -> Vec<C> {
    match cache.refresh().await {
        Some(fresh) => fresh,
        None => cache.snapshot().unwrap_or_default(),
    }
}

/// Turn a save result into the line shown to the scout, or the error to exit with.
pub fn describe_save(
    result: &SaveResult,
    what: &str,
    entry_limit: usize,
) -> Result<String, CliError> {
    match result {
        SaveResult::Saved { offline: false } => Ok(format!("Saved {what}")),
        SaveResult::Saved { offline: true } => Ok(format!(
            "Saved {what} offline; it will sync when the backend is reachable"
        )),
        SaveResult::LimitReached => Err(CliError::EntryLimit(entry_limit)),
        SaveResult::Rejected(rejection) if rejection.kind == RejectionKind::LimitReached => {
            Err(CliError::EntryLimit(entry_limit))
        }
        SaveResult::Rejected(rejection) => Err(CliError::Rejected(rejection.reason.clone())),
    }
}

pub fn parse_entry_ids(raw: &[String]) -> Result<Vec<EntryId>, CliError> {
    raw.iter()
        .map(|id| {
            let trimmed = id.trim();
            if trimmed.is_empty() {
                Err(CliError::EmptyEntryId)
            } else {
                Ok(EntryId::from(trimmed))
            }
        })
        .collect()
}

pub fn entry_to_list_item(entry: &ScoutingEntry, pending: bool, now_ms: i64) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        event: entry.event.clone(),
        match_number: entry.match_number,
        team_number: entry.team_number,
        scout_name: entry.scout_name.clone(),
        timestamp: entry.timestamp,
        relative_time: format_relative_time(entry.timestamp, now_ms),
        score: entry.match_score(),
        pending,
    }
}

pub fn format_entry_lines(items: &[EntryListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let short_id = item.id.chars().take(13).collect::<String>();
            let scout = item.scout_name.as_deref().unwrap_or("-");
            let line = format!(
                "{short_id:<13}  Q{:<4} {:>5}  {:>3} pts  {scout:<12}  {}",
                item.match_number, item.team_number, item.score, item.relative_time
            );
            if item.pending {
                format!("{line}  (pending)")
            } else {
                line
            }
        })
        .collect()
}

pub fn picklist_items(picklist: &[PicklistTeam], stats: &[TeamStats]) -> Vec<PicklistItem> {
    picklist
        .iter()
        .map(|team| PicklistItem {
            rank: team.rank,
            team_number: team.team_number,
            manual_override: team.manual_override,
            total_score: stats
                .iter()
                .find(|stat| stat.team_number == team.team_number)
                .map(|stat| stat.total_score),
        })
        .collect()
}

pub fn format_picklist_lines(items: &[PicklistItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let score = item
                .total_score
                .map_or_else(|| "-".to_string(), |score| format!("{score:.1}"));
            let marker = if item.manual_override { " *" } else { "" };
            format!(
                "{:>3}. {:>5}  {score:>6}{marker}",
                item.rank, item.team_number
            )
        })
        .collect()
}

pub fn format_stats_lines(stats: &[TeamStats]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5}  {:>3}  {:>6}  {:>6}  {:>5}  {:>5}  {:>6}",
        "Team", "MP", "Auto", "Teleop", "Climb", "Def", "Score"
    )];
    lines.extend(stats.iter().map(|stat| {
        format!(
            "{:>5}  {:>3}  {:>6.1}  {:>6.1}  {:>4}%  {:>4}%  {:>6.1}",
            stat.team_number,
            stat.matches_played,
            stat.avg_auto_cycles,
            stat.avg_teleop_cycles,
            stat.climb_success_rate,
            stat.defense_play_rate,
            stat.total_score
        )
    }));
    lines
}

pub fn plural(count: usize, singular: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {many}")
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

use scout_core::{ScoutingEntry, SyncEngine};

use crate::cli::EntryArgs;
use crate::commands::common::{
    describe_save, entry_to_list_item, format_entry_lines, load_collection, now_ms,
    parse_entry_ids, plural, EntryListItem,
};
use crate::error::CliError;

pub fn build_entry(args: &EntryArgs, event_key: String, scout_name: Option<String>) -> ScoutingEntry {
    let mut entry = ScoutingEntry::new(
        args.event.clone().unwrap_or(event_key),
        args.match_number,
        args.team,
    );
    entry.scout_name = args.scout.clone().or(scout_name);
    entry.auto_cycles = args.auto_cycles;
    entry.auto_preload = args.preload || args.preload_scored;
    entry.auto_preload_scored = args.preload_scored;
    entry.auto_est_cycle_size = args.auto_cycle_size;
    entry.auto_climb = args.auto_climb.into();
    entry.teleop_cycles = args.teleop_cycles;
    entry.estimated_cycle_size = args.cycle_size;
    entry.defense_played = args.defense.is_some();
    entry.defense_effectiveness = args.defense.unwrap_or(0);
    entry.climb_result = args.climb.into();
    entry.climb_stability = args.climb_stability;
    entry.driver_skill = args.driver_skill;
    entry.robot_speed = args.speed;
    entry.reliability = args.reliability;
    entry.notes = args.notes.trim().to_string();
    entry
}

pub async fn run_add(engine: &SyncEngine, args: &EntryArgs) -> Result<(), CliError> {
    let preferences = engine.preferences();
    let entry = build_entry(args, preferences.event_key(), preferences.scout_name());
    entry.validate()?;

    let id = entry.id.clone();
    let result = engine.save_entry(entry).await;
    let message = describe_save(&result, "entry", engine.entry_limit())?;
    println!("{message} ({id})");
    Ok(())
}

/// Confirmed entries plus anything still queued locally, newest first.
pub async fn collect_entries(engine: &SyncEngine, team: Option<u32>) -> Vec<EntryListItem> {
    let now = now_ms();
    let confirmed = load_collection(engine.entries()).await;
    let pending = engine.pending().entries();

    let mut items = pending
        .iter()
        .map(|entry| entry_to_list_item(entry, true, now))
        .chain(
            confirmed
                .iter()
                .filter(|entry| !pending.iter().any(|queued| queued.id == entry.id))
                .map(|entry| entry_to_list_item(entry, false, now)),
        )
        .filter(|item| team.map_or(true, |team| item.team_number == team))
        .collect::<Vec<_>>();
    items.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
    items
}

pub async fn run_list(
    engine: &SyncEngine,
    team: Option<u32>,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let mut items = collect_entries(engine, team).await;
    items.truncate(limit);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No entries");
    } else {
        for line in format_entry_lines(&items) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_delete(engine: &SyncEngine, ids: &[String], password: &str) -> Result<(), CliError> {
    let ids = parse_entry_ids(ids)?;
    if let [id] = ids.as_slice() {
        engine.delete_entry(id, password).await?;
    } else {
        engine.delete_entries(&ids, password).await?;
    }
    println!("Deleted {}", plural(ids.len(), "entry", "entries"));
    Ok(())
}

pub async fn run_delete_team(
    engine: &SyncEngine,
    teams: &[u32],
    password: &str,
) -> Result<(), CliError> {
    engine.delete_teams(teams, password).await?;
    let listed = teams
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Deleted all data for team(s) {listed}");
    Ok(())
}

use scout_core::{PitScoutingEntry, SyncEngine};

use crate::cli::PitArgs;
use crate::commands::common::{describe_save, format_timestamp, load_collection};
use crate::error::CliError;

pub fn build_pit_entry(
    args: &PitArgs,
    event_key: String,
    scout_name: Option<String>,
) -> PitScoutingEntry {
    let mut entry = PitScoutingEntry::new(args.event.clone().unwrap_or(event_key), args.team);
    if let Some(name) = args.scout.clone().or(scout_name) {
        entry.scout_name = name;
    }
    entry.auto_climb = args.auto_climb;
    entry.robot_climb = args.robot_climb.trim().to_string();
    entry.avg_balls = args.avg_balls;
    entry.max_balls = args.max_balls;
    entry.can_go_under_trench = args.under_trench;
    entry.can_go_over_bump = args.over_bump;
    entry.intake_type = args.intake.trim().to_string();
    entry.shooter_type = args.shooter.trim().to_string();
    entry
}

pub fn format_pit_lines(entry: &PitScoutingEntry) -> Vec<String> {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    vec![
        format!("Team {} @ {}", entry.team_number, entry.event),
        format!("  Scout:        {}", entry.scout_name),
        format!("  Auto climb:   {}", yes_no(entry.auto_climb)),
        format!("  Climb:        {}", blank_as_dash(&entry.robot_climb)),
        format!("  Balls:        avg {:.1}, max {}", entry.avg_balls, entry.max_balls),
        format!("  Under trench: {}", yes_no(entry.can_go_under_trench)),
        format!("  Over bump:    {}", yes_no(entry.can_go_over_bump)),
        format!("  Intake:       {}", blank_as_dash(&entry.intake_type)),
        format!("  Shooter:      {}", blank_as_dash(&entry.shooter_type)),
        format!("  Updated:      {}", format_timestamp(entry.timestamp)),
    ]
}

fn blank_as_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub async fn run_add(engine: &SyncEngine, args: &PitArgs) -> Result<(), CliError> {
    let preferences = engine.preferences();
    let entry = build_pit_entry(args, preferences.event_key(), preferences.scout_name());
    let team = entry.team_number;
    let result = engine.save_pit_entry(entry).await;
    let message = describe_save(&result, "pit entry", engine.entry_limit())?;
    println!("{message} (team {team})");
    Ok(())
}

pub async fn run_show(engine: &SyncEngine, team: u32, as_json: bool) -> Result<(), CliError> {
    let entry = engine
        .pit_entry_for_team(team)
        .await
        .ok_or(CliError::PitEntryNotFound(team))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        for line in format_pit_lines(&entry) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_list(engine: &SyncEngine, as_json: bool) -> Result<(), CliError> {
    let mut entries = load_collection(engine.pit_entries()).await;
    for queued in engine.pending().pit_entries() {
        scout_core::models::upsert_pit_entry(&mut entries, queued);
    }
    entries.sort_by_key(|entry| entry.team_number);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No pit entries");
    } else {
        for entry in &entries {
            println!(
                "{:>5}  {:<10}  climb {:<6}  shooter {:<8}  {}",
                entry.team_number,
                entry.event,
                blank_as_dash(&entry.robot_climb),
                blank_as_dash(&entry.shooter_type),
                entry.scout_name
            );
        }
    }
    Ok(())
}

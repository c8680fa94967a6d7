use scout_core::picklist::{self, MoveDirection};
use scout_core::stats::{all_team_stats, TeamStats};
use scout_core::{PicklistTeam, SyncEngine};

use crate::commands::common::{format_picklist_lines, load_collection, picklist_items};
use crate::error::CliError;

/// Saved picklist extended with any newly scouted teams, plus the stats it was built from.
async fn current_picklist(engine: &SyncEngine) -> (Vec<PicklistTeam>, Vec<TeamStats>) {
    let entries = load_collection(engine.entries()).await;
    let stats = all_team_stats(&entries);
    let saved = load_collection(engine.picklist()).await;
    (picklist::merge_with_stats(&saved, &stats), stats)
}

fn print_picklist(picklist: &[PicklistTeam], stats: &[TeamStats]) {
    if picklist.is_empty() {
        println!("Picklist is empty");
        return;
    }
    for line in format_picklist_lines(&picklist_items(picklist, stats)) {
        println!("{line}");
    }
}

pub async fn run_show(engine: &SyncEngine, as_json: bool) -> Result<(), CliError> {
    let (picklist, stats) = current_picklist(engine).await;
    if as_json {
        let items = picklist_items(&picklist, &stats);
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print_picklist(&picklist, &stats);
    }
    Ok(())
}

pub async fn run_reset(engine: &SyncEngine) -> Result<(), CliError> {
    let entries = load_collection(engine.entries()).await;
    let stats = all_team_stats(&entries);
    let picklist = picklist::reset_to_auto(&stats);
    engine.save_picklist(picklist.clone()).await?;
    println!("Picklist reset to statistics order");
    print_picklist(&picklist, &stats);
    Ok(())
}

pub async fn run_move(
    engine: &SyncEngine,
    team: u32,
    direction: MoveDirection,
) -> Result<(), CliError> {
    let (mut picklist, stats) = current_picklist(engine).await;
    if !picklist.iter().any(|entry| entry.team_number == team) {
        return Err(CliError::TeamNotOnPicklist(team));
    }
    if !picklist::move_team(&mut picklist, team, direction) {
        let way = match direction {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        };
        return Err(CliError::CannotMove(team, way));
    }
    engine.save_picklist(picklist.clone()).await?;
    print_picklist(&picklist, &stats);
    Ok(())
}

pub async fn run_add(engine: &SyncEngine, team: u32) -> Result<(), CliError> {
    let picklist = engine.add_to_picklist(team).await?;
    match picklist.iter().find(|entry| entry.team_number == team) {
        Some(entry) => println!("Added team {team} to the picklist at #{}", entry.rank),
        None => println!("Added team {team} to the picklist"),
    }
    Ok(())
}

pub async fn run_remove(engine: &SyncEngine, team: u32, password: &str) -> Result<(), CliError> {
    engine.remove_from_picklist(team, password).await?;
    println!("Removed team {team} from the picklist");
    Ok(())
}

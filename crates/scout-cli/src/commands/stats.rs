use scout_core::stats::{all_team_stats, team_stats};
use scout_core::SyncEngine;

use crate::commands::common::{format_stats_lines, load_collection};
use crate::error::CliError;

pub async fn run_stats(engine: &SyncEngine, team: Option<u32>, as_json: bool) -> Result<(), CliError> {
    let stats = if let Some(team) = team {
        let entries = engine.entries_for_team(team).await;
        let entries = if entries.is_empty() {
            load_collection(engine.entries())
                .await
                .into_iter()
                .filter(|entry| entry.team_number == team)
                .collect()
        } else {
            entries
        };
        vec![team_stats(&entries).ok_or(CliError::NoEntriesForTeam(team))?]
    } else {
        all_team_stats(&load_collection(engine.entries()).await)
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if stats.is_empty() {
        println!("No entries recorded yet");
    } else {
        for line in format_stats_lines(&stats) {
            println!("{line}");
        }
    }
    Ok(())
}

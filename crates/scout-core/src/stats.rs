//! Per-team statistics derived from match entries.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{ClimbResult, ScoutingEntry};
use crate::util::round_tenth;

/// Aggregated performance of one team across its scouted matches
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_number: u32,
    pub matches_played: usize,

    pub avg_auto_cycles: f64,
    pub median_auto_cycles: f64,
    pub std_dev_auto_cycles: f64,
    /// Percentage of preload attempts that scored
    pub auto_preload_success_rate: u32,
    pub avg_auto_cycle_size: f64,

    pub avg_teleop_cycles: f64,
    pub median_teleop_cycles: f64,
    pub std_dev_teleop_cycles: f64,
    pub avg_cycle_size: f64,

    pub climb_success_rate: u32,
    pub high_mid_climb_rate: u32,
    pub defense_play_rate: u32,
    /// Mean defense effectiveness over matches where defense was played
    pub avg_defense_rating: f64,

    pub avg_driver_skill: f64,
    pub avg_robot_speed: f64,
    pub avg_reliability: f64,

    /// Mean composite match score
    pub total_score: f64,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let squares: Vec<f64> = values.iter().map(|value| (value - mean).powi(2)).collect();
    self::mean(&squares).sqrt()
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

fn collect(entries: &[&ScoutingEntry], field: impl Fn(&ScoutingEntry) -> f64) -> Vec<f64> {
    entries.iter().map(|entry| field(entry)).collect()
}

/// Statistics for the entries of a single team; `None` for an empty slice.
///
/// The team number is taken from the first entry.
pub fn team_stats(entries: &[ScoutingEntry]) -> Option<TeamStats> {
    let refs: Vec<&ScoutingEntry> = entries.iter().collect();
    stats_for(&refs)
}

fn stats_for(entries: &[&ScoutingEntry]) -> Option<TeamStats> {
    let first = entries.first()?;
    let matches = entries.len();

    let auto_cycles = collect(entries, |entry| f64::from(entry.auto_cycles));
    let teleop_cycles = collect(entries, |entry| f64::from(entry.teleop_cycles));
    let avg_auto = mean(&auto_cycles);
    let avg_teleop = mean(&teleop_cycles);

    let preload_attempts = entries.iter().filter(|entry| entry.auto_preload).count();
    let preload_scored = entries
        .iter()
        .filter(|entry| entry.auto_preload && entry.auto_preload_scored)
        .count();

    let climbs = entries
        .iter()
        .filter(|entry| entry.climb_result.is_success())
        .count();
    let high_mid_climbs = entries
        .iter()
        .filter(|entry| matches!(entry.climb_result, ClimbResult::Mid | ClimbResult::High))
        .count();

    let defense: Vec<&&ScoutingEntry> = entries.iter().filter(|entry| entry.defense_played).collect();
    let defense_ratings: Vec<f64> = defense
        .iter()
        .map(|entry| f64::from(entry.defense_effectiveness))
        .collect();

    let scores = collect(entries, |entry| f64::from(entry.match_score()));

    Some(TeamStats {
        team_number: first.team_number,
        matches_played: matches,
        avg_auto_cycles: round_tenth(avg_auto),
        median_auto_cycles: round_tenth(median(&auto_cycles)),
        std_dev_auto_cycles: round_tenth(std_dev(&auto_cycles, avg_auto)),
        auto_preload_success_rate: percent(preload_scored, preload_attempts),
        avg_auto_cycle_size: round_tenth(mean(&collect(entries, |entry| entry.auto_est_cycle_size))),
        avg_teleop_cycles: round_tenth(avg_teleop),
        median_teleop_cycles: round_tenth(median(&teleop_cycles)),
        std_dev_teleop_cycles: round_tenth(std_dev(&teleop_cycles, avg_teleop)),
        avg_cycle_size: round_tenth(mean(&collect(entries, |entry| entry.estimated_cycle_size))),
        climb_success_rate: percent(climbs, matches),
        high_mid_climb_rate: percent(high_mid_climbs, matches),
        defense_play_rate: percent(defense.len(), matches),
        avg_defense_rating: round_tenth(mean(&defense_ratings)),
        avg_driver_skill: round_tenth(mean(&collect(entries, |entry| f64::from(entry.driver_skill)))),
        avg_robot_speed: round_tenth(mean(&collect(entries, |entry| f64::from(entry.robot_speed)))),
        avg_reliability: round_tenth(mean(&collect(entries, |entry| f64::from(entry.reliability)))),
        total_score: round_tenth(mean(&scores)),
    })
}

/// Statistics for every team present, best composite score first.
pub fn all_team_stats(entries: &[ScoutingEntry]) -> Vec<TeamStats> {
    let mut stats: Vec<TeamStats> = unique_teams(entries)
        .into_iter()
        .filter_map(|team| {
            let team_entries: Vec<&ScoutingEntry> = entries
                .iter()
                .filter(|entry| entry.team_number == team)
                .collect();
            stats_for(&team_entries)
        })
        .collect();
    stats.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    stats
}

/// Distinct team numbers, ascending
pub fn unique_teams(entries: &[ScoutingEntry]) -> Vec<u32> {
    entries
        .iter()
        .map(|entry| entry.team_number)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

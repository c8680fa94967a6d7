//! Picklist ordering for alliance selection.

use std::collections::HashSet;

use crate::models::PicklistTeam;
use crate::stats::TeamStats;

/// Direction for a one-step manual move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl std::str::FromStr for MoveDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown direction '{other}', expected up or down")),
        }
    }
}

/// Automatic ranking: statistics order (already sorted by score), ranks from 1.
pub fn from_stats(stats: &[TeamStats]) -> Vec<PicklistTeam> {
    let mut picklist: Vec<PicklistTeam> = stats
        .iter()
        .map(|team| PicklistTeam::new(team.team_number, 0))
        .collect();
    rerank(&mut picklist);
    picklist
}

/// Keep a saved order and append teams it has not seen yet, in statistics order.
///
/// An empty saved list means nothing was arranged yet, so the automatic
/// ranking is returned.
pub fn merge_with_stats(saved: &[PicklistTeam], stats: &[TeamStats]) -> Vec<PicklistTeam> {
    if saved.is_empty() {
        return from_stats(stats);
    }
    let mut ordered = saved.to_vec();
    ordered.sort_by_key(|team| team.rank);
    let known: HashSet<u32> = ordered.iter().map(|team| team.team_number).collect();
    ordered.extend(
        stats
            .iter()
            .filter(|team| !known.contains(&team.team_number))
            .map(|team| PicklistTeam::new(team.team_number, 0)),
    );
    rerank(&mut ordered);
    ordered
}

/// Move one team a single position; returns `false` when it cannot move.
pub fn move_team(picklist: &mut Vec<PicklistTeam>, team_number: u32, direction: MoveDirection) -> bool {
    let Some(index) = picklist.iter().position(|team| team.team_number == team_number) else {
        return false;
    };
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1).filter(|next| *next < picklist.len()),
    };
    let Some(target) = target else {
        return false;
    };

    let mut team = picklist.remove(index);
    team.manual_override = true;
    picklist.insert(target, team);
    rerank(picklist);
    true
}

/// Discard manual ordering and rank purely by statistics.
pub fn reset_to_auto(stats: &[TeamStats]) -> Vec<PicklistTeam> {
    from_stats(stats)
}

/// Assign dense 1-based ranks in list order.
pub fn rerank(picklist: &mut [PicklistTeam]) {
    for (rank, team) in (1..).zip(picklist.iter_mut()) {
        team.rank = rank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoutingEntry;
    use crate::stats::all_team_stats;
    use pretty_assertions::assert_eq;

    fn stats_for(teams_by_score: &[(u32, u32)]) -> Vec<TeamStats> {
        let entries: Vec<ScoutingEntry> = teams_by_score
            .iter()
            .map(|(team, cycles)| {
                let mut entry = ScoutingEntry::new("2026cahal", 1, *team);
                entry.teleop_cycles = *cycles;
                entry
            })
            .collect();
        all_team_stats(&entries)
    }

    fn order(picklist: &[PicklistTeam]) -> Vec<(u32, u32)> {
        picklist
            .iter()
            .map(|team| (team.team_number, team.rank))
            .collect()
    }

    #[test]
    fn auto_ranking_follows_score() {
        let stats = stats_for(&[(254, 5), (971, 9), (1678, 7)]);
        assert_eq!(
            order(&from_stats(&stats)),
            vec![(971, 1), (1678, 2), (254, 3)]
        );
    }

    #[test]
    fn merge_keeps_saved_order_and_appends_new_teams() {
        let stats = stats_for(&[(254, 5), (971, 9), (1678, 7)]);
        let saved = vec![PicklistTeam::new(254, 1), PicklistTeam::new(971, 2)];
        assert_eq!(
            order(&merge_with_stats(&saved, &stats)),
            vec![(254, 1), (971, 2), (1678, 3)]
        );
    }

    #[test]
    fn move_sets_override_and_reranks() {
        let stats = stats_for(&[(254, 5), (971, 9), (1678, 7)]);
        let mut picklist = from_stats(&stats);

        assert!(move_team(&mut picklist, 254, MoveDirection::Up));
        assert_eq!(order(&picklist), vec![(971, 1), (254, 2), (1678, 3)]);
        assert!(picklist[1].manual_override);
        assert!(!picklist[0].manual_override);

        assert!(!move_team(&mut picklist, 971, MoveDirection::Up));
        assert!(!move_team(&mut picklist, 1678, MoveDirection::Down));
        assert!(!move_team(&mut picklist, 9999, MoveDirection::Down));
    }

    #[test]
    fn reset_drops_manual_overrides() {
        let stats = stats_for(&[(254, 5), (971, 9)]);
        let reset = reset_to_auto(&stats);
        assert!(reset.iter().all(|team| !team.manual_override));
        assert_eq!(order(&reset), vec![(971, 1), (254, 2)]);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("UP".parse::<MoveDirection>(), Ok(MoveDirection::Up));
        assert!("sideways".parse::<MoveDirection>().is_err());
    }
}

//! Pit scouting entry model

use serde::{Deserialize, Serialize};

fn default_scout_name() -> String {
    "Unknown".to_string()
}

fn default_shooter_type() -> String {
    "none".to_string()
}

/// Static robot capabilities for one team at one event.
///
/// Upserted rather than appended: the `(team_number, event)` pair is the key
/// and the last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitScoutingEntry {
    pub team_number: u32,
    #[serde(default)]
    pub event: String,
    #[serde(default = "default_scout_name")]
    pub scout_name: String,
    #[serde(default)]
    pub auto_climb: bool,
    #[serde(default)]
    pub robot_climb: String,
    #[serde(default)]
    pub avg_balls: f64,
    #[serde(default)]
    pub max_balls: u32,
    #[serde(default)]
    pub can_go_under_trench: bool,
    #[serde(default)]
    pub can_go_over_bump: bool,
    #[serde(default)]
    pub intake_type: String,
    #[serde(default = "default_shooter_type")]
    pub shooter_type: String,
    /// Last update timestamp (Unix ms)
    pub timestamp: i64,
}

impl PitScoutingEntry {
    /// Create an empty pit entry for a team at an event
    #[must_use]
    pub fn new(event: impl Into<String>, team_number: u32) -> Self {
        Self {
            team_number,
            event: event.into(),
            scout_name: default_scout_name(),
            auto_climb: false,
            robot_climb: String::new(),
            avg_balls: 0.0,
            max_balls: 0,
            can_go_under_trench: false,
            can_go_over_bump: false,
            intake_type: String::new(),
            shooter_type: default_shooter_type(),
            timestamp: crate::util::unix_millis_now(),
        }
    }

    /// Upsert key
    pub fn key(&self) -> (u32, &str) {
        (self.team_number, self.event.as_str())
    }

    /// Whether two entries describe the same team at the same event
    pub fn same_key(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// Insert `entry` at the front of `list`, dropping any older entry with the same key
pub fn upsert_pit_entry(list: &mut Vec<PitScoutingEntry>, entry: PitScoutingEntry) {
    list.retain(|existing| !existing.same_key(&entry));
    list.insert(0, entry);
}

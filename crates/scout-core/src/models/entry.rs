//! Match scouting entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unique identifier for a scouting entry.
///
/// Assigned by the client when the entry is created, never by the server, so a
/// retried send always carries the same identity. New ids are UUID v7
/// (millisecond timestamp plus random suffix); ids minted by older clients are
/// accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Climb attempted during the autonomous period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AutoClimb {
    #[default]
    None,
    Side,
    Middle,
}

/// Endgame climb outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClimbResult {
    #[default]
    None,
    Attempted,
    Low,
    Mid,
    High,
}

impl ClimbResult {
    /// Whether the robot ended the match hanging at any level
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Low | Self::Mid | Self::High)
    }

    /// Endgame points awarded for this climb
    pub const fn points(self) -> u32 {
        match self {
            Self::None | Self::Attempted => 0,
            Self::Low => 10,
            Self::Mid => 20,
            Self::High => 30,
        }
    }
}

const fn default_rating() -> u8 {
    3
}

/// One scout's observations of one team in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoutingEntry {
    pub id: EntryId,
    /// Competition key, e.g. `2026cahal`
    pub event: String,
    pub match_number: u32,
    pub team_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scout_name: Option<String>,
    /// Creation timestamp (Unix ms)
    pub timestamp: i64,

    // Autonomous
    #[serde(default)]
    pub auto_cycles: u32,
    #[serde(default)]
    pub auto_preload: bool,
    #[serde(default)]
    pub auto_preload_scored: bool,
    #[serde(default)]
    pub auto_est_cycle_size: f64,
    #[serde(default)]
    pub auto_climb: AutoClimb,

    // Teleop
    #[serde(default)]
    pub teleop_cycles: u32,
    #[serde(default)]
    pub estimated_cycle_size: f64,
    #[serde(default)]
    pub defense_played: bool,
    /// 1-5, meaningful only when `defense_played`
    #[serde(default)]
    pub defense_effectiveness: u8,

    // Endgame
    #[serde(default)]
    pub climb_result: ClimbResult,
    #[serde(default = "default_rating")]
    pub climb_stability: u8,

    // Overall, 1-5
    #[serde(default = "default_rating")]
    pub driver_skill: u8,
    #[serde(default = "default_rating")]
    pub robot_speed: u8,
    #[serde(default = "default_rating")]
    pub reliability: u8,
    #[serde(default)]
    pub notes: String,
}

impl ScoutingEntry {
    /// Create an entry with a fresh id, the current timestamp, and a neutral payload
    #[must_use]
    pub fn new(event: impl Into<String>, match_number: u32, team_number: u32) -> Self {
        Self {
            id: EntryId::new(),
            event: event.into(),
            match_number,
            team_number,
            scout_name: None,
            timestamp: crate::util::unix_millis_now(),
            auto_cycles: 0,
            auto_preload: false,
            auto_preload_scored: false,
            auto_est_cycle_size: 0.0,
            auto_climb: AutoClimb::None,
            teleop_cycles: 0,
            estimated_cycle_size: 0.0,
            defense_played: false,
            defense_effectiveness: 0,
            climb_result: ClimbResult::None,
            climb_stability: default_rating(),
            driver_skill: default_rating(),
            robot_speed: default_rating(),
            reliability: default_rating(),
            notes: String::new(),
        }
    }

    /// Validate identity fields before the entry is stored or sent
    pub fn validate(&self) -> crate::Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(crate::Error::InvalidInput("entry id is required".into()));
        }
        if self.event.trim().is_empty() {
            return Err(crate::Error::InvalidInput("event key is required".into()));
        }
        if self.team_number == 0 {
            return Err(crate::Error::InvalidInput(
                "team number must be positive".into(),
            ));
        }
        let ratings = [
            self.climb_stability,
            self.driver_skill,
            self.robot_speed,
            self.reliability,
        ];
        if ratings.iter().any(|rating| !(1..=5).contains(rating)) {
            return Err(crate::Error::InvalidInput(
                "ratings must be between 1 and 5".into(),
            ));
        }
        if self.defense_effectiveness > 5 {
            return Err(crate::Error::InvalidInput(
                "defense effectiveness must be between 0 and 5".into(),
            ));
        }
        Ok(())
    }

    /// Points this entry contributes to the team's composite score.
    ///
    /// Counters are unbounded on the wire, so the sum saturates at `u32::MAX`.
    pub fn match_score(&self) -> u32 {
        let preload = if self.auto_preload && self.auto_preload_scored {
            8
        } else {
            0
        };
        let auto_climb = if self.auto_climb == AutoClimb::None {
            0
        } else {
            15
        };
        self.auto_cycles
            .saturating_add(preload)
            .saturating_add(auto_climb)
            .saturating_add(self.teleop_cycles)
            .saturating_add(self.climb_result.points())
    }
}

//! Picklist model

use serde::{Deserialize, Serialize};

/// One team's position in the alliance-selection ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistTeam {
    pub team_number: u32,
    /// Dense 1-based rank
    pub rank: u32,
    /// Set when a person moved this team instead of the statistics ordering
    #[serde(default)]
    pub manual_override: bool,
}

impl PicklistTeam {
    pub const fn new(team_number: u32, rank: u32) -> Self {
        Self {
            team_number,
            rank,
            manual_override: false,
        }
    }
}

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scout_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Entry limit of {0} reached; no more entries can be saved")]
    EntryLimit(usize),
    #[error("Backend rejected the record: {0}")]
    Rejected(String),
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Scout name cannot be empty")]
    EmptyScoutName,
    #[error("Team {0} is not on the picklist")]
    TeamNotOnPicklist(u32),
    #[error("Team {0} cannot move further {1}")]
    CannotMove(u32, &'static str),
    #[error("No entries recorded for team {0}")]
    NoEntriesForTeam(u32),
    #[error("No pit entry recorded for team {0}")]
    PitEntryNotFound(u32),
    #[error("Configuration error: {0}")]
    Config(String),
}

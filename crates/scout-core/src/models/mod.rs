//! Data models for Scout

mod entry;
mod picklist;
mod pit;

pub use entry::{AutoClimb, ClimbResult, EntryId, ScoutingEntry};
pub use picklist::PicklistTeam;
pub use pit::{upsert_pit_entry, PitScoutingEntry};

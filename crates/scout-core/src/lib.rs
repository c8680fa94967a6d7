//! scout-core - Core library for Scout
//!
//! This crate contains the shared models, the offline-first sync layer, and
//! the statistics used by every Scout interface (CLI and API server).

pub mod accessor;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod observer;
pub mod picklist;
pub mod stats;
pub mod status;
pub mod sync;
pub mod util;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use models::{EntryId, PicklistTeam, PitScoutingEntry, ScoutingEntry};
pub use sync::{DrainOutcome, DrainReport, Notice, SaveResult, SyncEngine};

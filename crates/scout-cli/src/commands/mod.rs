pub mod common;
pub mod entry;
pub mod event;
pub mod picklist;
pub mod pit;
pub mod profile;
pub mod stats;
pub mod sync;

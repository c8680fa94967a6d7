//! scout-api - Backend REST API for Scout
//!
//! Stores match entries, pit entries, the picklist, and the active event key
//! in SQLite. `POST /entries` is the authoritative enforcement point of the
//! global entry cap and is idempotent by entry id.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use routes::{app_router, AppState};
pub use store::Store;

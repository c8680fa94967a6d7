use scout_core::SyncEngine;

use crate::error::CliError;

pub async fn run_show(engine: &SyncEngine) -> Result<(), CliError> {
    println!("{}", engine.refresh_event_key().await);
    Ok(())
}

pub async fn run_set(engine: &SyncEngine, key: &str, password: &str) -> Result<(), CliError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Config("event key cannot be empty".to_string()));
    }
    engine.update_event_key(key, password).await?;
    println!("Active event is now {key}");
    Ok(())
}

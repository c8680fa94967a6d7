use scout_core::SyncEngine;

use crate::error::CliError;

pub fn normalize_scout_name(raw: &str) -> Result<String, CliError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        Err(CliError::EmptyScoutName)
    } else {
        Ok(name)
    }
}

pub fn run_scout_name(engine: &SyncEngine, name: Option<&str>) -> Result<(), CliError> {
    let preferences = engine.preferences();
    if let Some(raw) = name {
        let name = normalize_scout_name(raw)?;
        preferences.set_scout_name(&name);
        println!("Scout name set to {name}");
    } else {
        match preferences.scout_name() {
            Some(name) => println!("{name}"),
            None => println!("No scout name set"),
        }
    }
    Ok(())
}

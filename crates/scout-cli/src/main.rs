//! Scout CLI - Offline-first match scouting from the terminal
//!
//! Every command runs against the local cache first; records that cannot reach
//! the backend are queued and pushed on the next invocation.

mod cli;
mod commands;
mod error;


use std::env;

use clap::Parser;

use crate::cli::{Cli, Commands, EntryCommands, EventCommands, PicklistCommands, PitCommands};
use crate::commands::common::{open_engine, resolve_client_config, resolve_data_dir};
use crate::commands::{entry, event, picklist, pit, profile, stats, sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scout_cli=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);
    let config = resolve_client_config(cli.api_url, |name| env::var(name).ok())?;
    tracing::debug!(data_dir = %data_dir.display(), api = %config.api_base_url, "Opening scout data");

    let (engine, startup) = open_engine(&config, &data_dir).await?;

    match cli.command {
        Commands::Entry { command } => match command {
            EntryCommands::Add(args) => entry::run_add(&engine, &args).await?,
            EntryCommands::List { team, limit, json } => {
                entry::run_list(&engine, team, limit, json).await?;
            }
            EntryCommands::Delete { ids, password } => {
                entry::run_delete(&engine, &ids, &password).await?;
            }
            EntryCommands::DeleteTeam { teams, password } => {
                entry::run_delete_team(&engine, &teams, &password).await?;
            }
        },
        Commands::Pit { command } => match command {
            PitCommands::Add(args) => pit::run_add(&engine, &args).await?,
            PitCommands::Show { team, json } => pit::run_show(&engine, team, json).await?,
            PitCommands::List { json } => pit::run_list(&engine, json).await?,
        },
        Commands::Picklist { command } => {
            match command.unwrap_or(PicklistCommands::Show { json: false }) {
                PicklistCommands::Show { json } => picklist::run_show(&engine, json).await?,
                PicklistCommands::Reset => picklist::run_reset(&engine).await?,
                PicklistCommands::Move { team, direction } => {
                    picklist::run_move(&engine, team, direction.into()).await?;
                }
                PicklistCommands::Add { team } => picklist::run_add(&engine, team).await?,
                PicklistCommands::Remove { team, password } => {
                    picklist::run_remove(&engine, team, &password).await?;
                }
            }
        }
        Commands::Stats { team, json } => stats::run_stats(&engine, team, json).await?,
        Commands::Sync => sync::run_sync(&engine, startup).await?,
        Commands::Status { json } => sync::run_status(&engine, json)?,
        Commands::Event { command } => match command.unwrap_or(EventCommands::Show) {
            EventCommands::Show => event::run_show(&engine).await?,
            EventCommands::Set { key, password } => {
                event::run_set(&engine, &key, &password).await?;
            }
        },
        Commands::ScoutName { name } => profile::run_scout_name(&engine, name.as_deref())?,
    }

    Ok(())
}

use scout_core::{DrainOutcome, DrainReport, SyncEngine};
use serde::Serialize;

use crate::commands::common::{entry_to_list_item, format_entry_lines, now_ms, plural};
use crate::error::CliError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    pub pending_count: usize,
    pub pending_entries: usize,
    pub pending_pit_entries: usize,
    pub is_syncing: bool,
    pub online: bool,
    pub event_key: String,
    pub label: String,
}

pub fn format_drain_report(report: &DrainReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Synced {} and {}",
        plural(report.accepted_entries, "entry", "entries"),
        plural(report.accepted_pit_entries, "pit entry", "pit entries"),
    )];
    lines.extend(
        report
            .rejected
            .iter()
            .map(|rejection| format!("  rejected ({}): {}", rejection.status, rejection.reason)),
    );
    if report.still_pending > 0 {
        lines.push(format!("{} record(s) still pending", report.still_pending));
    }
    lines
}

/// Report the drain that already ran at startup, or drain now if it did not.
pub async fn run_sync(engine: &SyncEngine, startup: DrainOutcome) -> Result<(), CliError> {
    let outcome = match startup {
        DrainOutcome::Completed(report) => DrainOutcome::Completed(report),
        _ => engine.drain().await,
    };

    match outcome {
        DrainOutcome::Completed(report) => {
            for line in format_drain_report(&report) {
                println!("{line}");
            }
        }
        DrainOutcome::Idle => println!("Nothing to sync"),
        DrainOutcome::Busy => println!("A sync is already running"),
        DrainOutcome::Offline => println!("Offline; queued records stay pending"),
    }
    Ok(())
}

pub fn status_item(engine: &SyncEngine) -> StatusItem {
    let status = engine.status().current();
    StatusItem {
        pending_count: status.pending_count,
        pending_entries: engine.pending().entry_count(),
        pending_pit_entries: engine.pending().pit_entries().len(),
        is_syncing: status.is_syncing,
        online: engine.is_online(),
        event_key: engine.preferences().event_key(),
        label: status.label(),
    }
}

pub fn run_status(engine: &SyncEngine, as_json: bool) -> Result<(), CliError> {
    let item = status_item(engine);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{}", item.label);
    println!("Event: {}", item.event_key);
    if item.pending_count > 0 {
        println!(
            "Queued: {}, {}",
            plural(item.pending_entries, "entry", "entries"),
            plural(item.pending_pit_entries, "pit entry", "pit entries"),
        );
        let now = now_ms();
        let queued = engine
            .pending()
            .entries()
            .iter()
            .map(|entry| entry_to_list_item(entry, true, now))
            .collect::<Vec<_>>();
        for line in format_entry_lines(&queued) {
            println!("  {line}");
        }
    }
    Ok(())
}

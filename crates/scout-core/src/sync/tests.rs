use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::cache::{FileStore, MemoryStore};
use crate::status::SyncStatus;
use crate::testing::{FakeGateway, ADMIN_PASSWORD};

const EVENT: &str = "2026cahal";

fn engine_over(gateway: &Arc<FakeGateway>, store: Arc<dyn LocalStore>) -> SyncEngine {
    let dyn_gateway: Arc<dyn RemoteGateway> = gateway.clone();
    SyncEngine::new(dyn_gateway, store).with_settle_delay(Duration::ZERO)
}

fn engine(gateway: &Arc<FakeGateway>) -> SyncEngine {
    engine_over(gateway, Arc::new(MemoryStore::new()))
}

fn record_statuses(engine: &SyncEngine) -> Arc<Mutex<Vec<SyncStatus>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.status().subscribe(move |status| sink.lock().unwrap().push(*status));
    seen
}

fn record_notices(engine: &SyncEngine) -> Arc<Mutex<Vec<Notice>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe_notices(move |notice| sink.lock().unwrap().push(notice.clone()));
    seen
}

fn status(pending_count: usize, is_syncing: bool) -> SyncStatus {
    SyncStatus {
        pending_count,
        is_syncing,
    }
}

fn ids(entries: &[ScoutingEntry]) -> Vec<EntryId> {
    entries.iter().map(|entry| entry.id.clone()).collect()
}

#[tokio::test]
async fn online_save_lands_in_confirmed_cache() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let statuses = record_statuses(&engine);
    let entry = ScoutingEntry::new(EVENT, 12, 2473);

    let result = engine.save_entry(entry.clone()).await;

    assert_eq!(result, SaveResult::Saved { offline: false });
    assert!(engine.pending().is_empty());
    assert_eq!(engine.entries().snapshot(), Some(vec![entry.clone()]));
    assert_eq!(ids(&gateway.remote_entries()), vec![entry.id]);
    assert!(statuses.lock().unwrap().is_empty());
}

#[tokio::test]
async fn offline_save_then_reconnect_delivers_queued_entry() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let statuses = record_statuses(&engine);
    let notices = record_notices(&engine);
    let entry = ScoutingEntry::new(EVENT, 12, 2473);

    gateway.set_online(false);
    engine.set_online(false);
    let result = engine.save_entry(entry.clone()).await;

    assert!(result.is_offline());
    assert_eq!(ids(&engine.pending().entries()), vec![entry.id.clone()]);
    assert_eq!(engine.status().current(), status(1, false));

    gateway.set_online(true);
    let outcome = engine.connectivity_restored().await;

    let report = outcome.report().expect("drain should run");
    assert_eq!(report.accepted_entries, 1);
    assert_eq!(report.still_pending, 0);
    assert!(engine.pending().is_empty());
    assert_eq!(ids(&gateway.remote_entries()), vec![entry.id.clone()]);
    assert_eq!(ids(&engine.entries().snapshot().unwrap()), vec![entry.id]);
    assert_eq!(
        *statuses.lock().unwrap(),
        vec![status(1, false), status(1, true), status(0, false)]
    );
    assert_eq!(
        *notices.lock().unwrap(),
        vec![Notice::SavedOffline, Notice::Synced { count: 1 }]
    );
}

#[tokio::test]
async fn limit_counts_confirmed_and_queued_entries() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway).with_entry_limit(3);
    gateway.set_remote_entries(vec![
        ScoutingEntry::new(EVENT, 1, 1),
        ScoutingEntry::new(EVENT, 2, 2),
    ]);

    gateway.set_online(false);
    assert!(engine.save_entry(ScoutingEntry::new(EVENT, 3, 3)).await.is_offline());
    gateway.set_online(true);
    engine.entries().refresh().await;
    let attempts_before = gateway.attempts().len();

    let result = engine.save_entry(ScoutingEntry::new(EVENT, 4, 4)).await;

    assert_eq!(result, SaveResult::LimitReached);
    assert_eq!(gateway.attempts().len(), attempts_before);
    assert_eq!(engine.pending().len(), 1);
}

#[tokio::test]
async fn remote_limit_rejection_is_not_queued() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_entry_limit(1);
    gateway.set_remote_entries(vec![ScoutingEntry::new(EVENT, 1, 1)]);
    let engine = engine(&gateway);
    let notices = record_notices(&engine);

    let result = engine.save_entry(ScoutingEntry::new(EVENT, 2, 2)).await;

    assert_eq!(result, SaveResult::LimitReached);
    assert!(engine.pending().is_empty());
    assert_eq!(
        *notices.lock().unwrap(),
        vec![Notice::LimitReached {
            limit: crate::config::ENTRY_LIMIT
        }]
    );
}

#[tokio::test]
async fn validation_rejection_is_surfaced_not_queued() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let entry = ScoutingEntry::new(EVENT, 1, 1);
    gateway.reject_entry(&entry.id, 400);

    let result = engine.save_entry(entry).await;

    assert!(matches!(
        result,
        SaveResult::Rejected(Rejection {
            kind: RejectionKind::Invalid,
            status: 400,
            ..
        })
    ));
    assert!(engine.pending().is_empty());
}

#[tokio::test]
async fn offline_saves_stop_at_entry_limit() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_online(false);
    let engine = engine(&gateway).with_entry_limit(2);

    assert!(engine.save_entry(ScoutingEntry::new(EVENT, 1, 1)).await.is_offline());
    assert!(engine.save_entry(ScoutingEntry::new(EVENT, 2, 2)).await.is_offline());
    let result = engine.save_entry(ScoutingEntry::new(EVENT, 3, 3)).await;

    assert_eq!(result, SaveResult::LimitReached);
    assert_eq!(engine.pending().len(), 2);
}

#[tokio::test]
async fn drain_retries_in_fifo_order_and_keeps_failures() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    gateway.set_online(false);
    let first = ScoutingEntry::new(EVENT, 1, 1);
    let second = ScoutingEntry::new(EVENT, 2, 2);
    let third = ScoutingEntry::new(EVENT, 3, 3);
    for entry in [&first, &second, &third] {
        engine.save_entry(entry.clone()).await;
    }
    gateway.set_online(true);
    let attempts_before = gateway.attempts().len();
    gateway.push_outcome(SendOutcome::Accepted);
    gateway.push_outcome(SendOutcome::Unavailable("timeout".into()));

    let outcome = engine.drain().await;

    assert_eq!(
        gateway.attempts()[attempts_before..].to_vec(),
        ids(&[first.clone(), second.clone(), third.clone()])
    );
    assert_eq!(ids(&engine.pending().entries()), vec![second.id.clone()]);
    let report = outcome.report().unwrap();
    assert_eq!(report.accepted_entries, 2);
    assert_eq!(report.still_pending, 1);
    assert_eq!(
        ids(&engine.entries().snapshot().unwrap()),
        vec![third.id, first.id]
    );
}

#[tokio::test]
async fn rejected_records_stay_queued_during_drain() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let entry = ScoutingEntry::new(EVENT, 1, 1);
    gateway.set_online(false);
    engine.save_entry(entry.clone()).await;
    gateway.set_online(true);
    gateway.reject_entry(&entry.id, 422);

    let outcome = engine.drain().await;

    let report = outcome.report().unwrap();
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].status, 422);
    assert_eq!(ids(&engine.pending().entries()), vec![entry.id]);
}

#[tokio::test]
async fn drain_with_empty_queue_is_idle() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let statuses = record_statuses(&engine);
    let notices = record_notices(&engine);

    assert_eq!(engine.drain().await, DrainOutcome::Idle);
    assert_eq!(*statuses.lock().unwrap(), vec![status(0, false)]);
    assert!(notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn drain_is_skipped_while_offline() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    gateway.set_online(false);
    engine.save_entry(ScoutingEntry::new(EVENT, 1, 1)).await;
    engine.set_online(false);

    assert_eq!(engine.drain().await, DrainOutcome::Offline);
    assert_eq!(engine.pending().len(), 1);
}

#[tokio::test]
async fn concurrent_drain_is_single_flight() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = Arc::new(engine(&gateway));
    gateway.set_online(false);
    engine.save_entry(ScoutingEntry::new(EVENT, 1, 1)).await;
    gateway.set_online(true);
    let attempts_before = gateway.attempts().len();

    let release = gateway.pause_next_send();
    let running = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.drain().await }
    });
    while gateway.attempts().len() == attempts_before {
        tokio::task::yield_now().await;
    }

    assert_eq!(engine.drain().await, DrainOutcome::Busy);
    assert!(engine.status().current().is_syncing);

    release.notify_one();
    let outcome = running.await.unwrap();
    assert_eq!(outcome.report().unwrap().accepted_entries, 1);
    assert_eq!(gateway.remote_entries().len(), 1);
    assert_eq!(engine.status().current(), status(0, false));
}

#[tokio::test]
async fn save_during_drain_is_not_lost() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = Arc::new(engine(&gateway));
    let queued = ScoutingEntry::new(EVENT, 1, 1);
    gateway.set_online(false);
    engine.save_entry(queued.clone()).await;
    gateway.set_online(true);
    let attempts_before = gateway.attempts().len();

    let release = gateway.pause_next_send();
    let running = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.drain().await }
    });
    while gateway.attempts().len() == attempts_before {
        tokio::task::yield_now().await;
    }

    let late = ScoutingEntry::new(EVENT, 2, 2);
    gateway.push_outcome(SendOutcome::Unavailable("blip".into()));
    assert!(engine.save_entry(late.clone()).await.is_offline());

    release.notify_one();
    running.await.unwrap();

    assert_eq!(ids(&engine.pending().entries()), vec![late.id]);
    assert_eq!(ids(&gateway.remote_entries()), vec![queued.id]);
}

#[tokio::test]
async fn delete_during_drain_stays_deleted() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = Arc::new(engine(&gateway));
    let queued = ScoutingEntry::new(EVENT, 1, 1);
    gateway.set_online(false);
    engine.save_entry(queued.clone()).await;
    gateway.set_online(true);
    let attempts_before = gateway.attempts().len();

    let release = gateway.pause_next_send();
    let running = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.drain().await }
    });
    while gateway.attempts().len() == attempts_before {
        tokio::task::yield_now().await;
    }

    engine.delete_entry(&queued.id, ADMIN_PASSWORD).await.unwrap();
    gateway.push_outcome(SendOutcome::Unavailable("blip".into()));

    release.notify_one();
    running.await.unwrap();

    assert!(engine.pending().is_empty());
    assert!(gateway.remote_entries().is_empty());
    assert_eq!(engine.status().current(), status(0, false));
}

#[tokio::test]
async fn queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_online(false);
    let entry = ScoutingEntry::new(EVENT, 7, 254);
    {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let engine = engine_over(&gateway, store);
        assert!(engine.save_entry(entry.clone()).await.is_offline());
    }

    gateway.set_online(true);
    gateway.set_event_key("2026casj");
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let engine = engine_over(&gateway, store);
    assert_eq!(engine.status().current(), status(1, false));

    let outcome = engine.start().await;

    assert_eq!(outcome.report().unwrap().accepted_entries, 1);
    assert_eq!(ids(&gateway.remote_entries()), vec![entry.id]);
    assert_eq!(engine.preferences().event_key(), "2026casj");
    assert!(engine.pending().is_empty());
}

#[tokio::test]
async fn duplicate_offline_save_is_queued_once() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_online(false);
    let engine = engine(&gateway);
    let entry = ScoutingEntry::new(EVENT, 1, 1);

    engine.save_entry(entry.clone()).await;
    engine.save_entry(entry).await;

    assert_eq!(engine.pending().len(), 1);
}

#[tokio::test]
async fn lost_acknowledgement_does_not_duplicate_remote_entry() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let entry = ScoutingEntry::new(EVENT, 1, 1);
    // Stored remotely, but the response never reached the client.
    gateway.set_remote_entries(vec![entry.clone()]);
    gateway.push_outcome(SendOutcome::Unavailable("timeout".into()));
    assert!(engine.save_entry(entry.clone()).await.is_offline());

    engine.drain().await;

    let remote = gateway.remote_entries();
    assert_eq!(remote.iter().filter(|r| r.id == entry.id).count(), 1);
    assert!(engine.pending().is_empty());
}

#[tokio::test]
async fn offline_pit_save_upserts_queue_and_serves_fallback() {
    let gateway = Arc::new(FakeGateway::new());
    gateway.set_online(false);
    let engine = engine(&gateway);
    let mut pit = PitScoutingEntry::new(EVENT, 254);
    engine.save_pit_entry(pit.clone()).await;
    pit.max_balls = 40;
    assert!(engine.save_pit_entry(pit.clone()).await.is_offline());

    assert_eq!(engine.pending().pit_entries(), vec![pit.clone()]);
    assert_eq!(engine.status().current().pending_count, 1);
    assert_eq!(engine.pit_entry_for_team(254).await, Some(pit.clone()));

    gateway.set_online(true);
    let outcome = engine.drain().await;

    assert_eq!(outcome.report().unwrap().accepted_pit_entries, 1);
    assert_eq!(gateway.remote_pit_entries(), vec![pit.clone()]);
    assert_eq!(engine.pit_entries().snapshot(), Some(vec![pit]));
}

#[tokio::test]
async fn delete_teams_clears_cache_and_queues() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let kept = ScoutingEntry::new(EVENT, 1, 971);
    engine.save_entry(kept.clone()).await;
    engine.save_entry(ScoutingEntry::new(EVENT, 2, 254)).await;
    gateway.set_online(false);
    engine.save_entry(ScoutingEntry::new(EVENT, 3, 254)).await;
    engine.save_pit_entry(PitScoutingEntry::new(EVENT, 254)).await;
    gateway.set_online(true);

    engine.delete_teams(&[254], ADMIN_PASSWORD).await.unwrap();

    assert!(engine.pending().is_empty());
    assert_eq!(ids(&engine.entries().snapshot().unwrap()), vec![kept.id.clone()]);
    assert_eq!(ids(&gateway.remote_entries()), vec![kept.id]);
}

#[tokio::test]
async fn delete_teams_keeps_pit_data_when_pit_delete_fails() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let pit = PitScoutingEntry::new(EVENT, 254);
    engine.save_entry(ScoutingEntry::new(EVENT, 1, 254)).await;
    engine.save_pit_entry(pit.clone()).await;
    gateway.set_online(false);
    engine.save_entry(ScoutingEntry::new(EVENT, 2, 254)).await;
    gateway.set_online(true);
    gateway.fail_pit_deletes(500);

    let error = engine.delete_teams(&[254], ADMIN_PASSWORD).await.unwrap_err();

    assert!(matches!(
        error,
        Error::Gateway(crate::gateway::GatewayError::Status { status: 500, .. })
    ));
    assert!(engine.pending().is_empty());
    assert_eq!(engine.entries().snapshot(), Some(vec![]));
    assert!(gateway.remote_entries().is_empty());
    assert_eq!(engine.pit_entries().snapshot(), Some(vec![pit.clone()]));
    assert_eq!(gateway.remote_pit_entries(), vec![pit]);
    assert_eq!(engine.status().current(), status(0, false));
}

#[tokio::test]
async fn admin_delete_with_wrong_password_keeps_data() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let entry = ScoutingEntry::new(EVENT, 1, 1);
    engine.save_entry(entry.clone()).await;

    let error = engine.delete_entry(&entry.id, "guess").await.unwrap_err();

    assert!(matches!(
        error,
        Error::Gateway(crate::gateway::GatewayError::Unauthorized)
    ));
    assert_eq!(engine.entries().snapshot().unwrap().len(), 1);
}

#[tokio::test]
async fn event_key_falls_back_to_cached_value() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    gateway.set_event_key("2026casf");
    assert_eq!(engine.refresh_event_key().await, "2026casf");

    gateway.set_online(false);
    assert_eq!(engine.refresh_event_key().await, "2026casf");
}

#[tokio::test]
async fn picklist_writes_update_cache() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    engine
        .save_picklist(vec![PicklistTeam::new(254, 1), PicklistTeam::new(971, 2)])
        .await
        .unwrap();

    let picklist = engine.add_to_picklist(1678).await.unwrap();
    assert_eq!(picklist.last(), Some(&PicklistTeam::new(1678, 3)));

    engine
        .remove_from_picklist(971, ADMIN_PASSWORD)
        .await
        .unwrap();
    let cached: Vec<u32> = engine
        .picklist()
        .snapshot()
        .unwrap()
        .iter()
        .map(|team| team.team_number)
        .collect();
    assert_eq!(cached, vec![254, 1678]);
}

#[tokio::test]
async fn picklist_is_served_from_cache_offline() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    let remote = vec![PicklistTeam::new(1678, 1), PicklistTeam::new(254, 2)];
    gateway.set_remote_picklist(remote.clone());

    assert_eq!(engine.picklist().get().await, remote);

    gateway.set_online(false);
    gateway.set_remote_picklist(vec![]);
    let (cached, refresh) = engine.picklist().get_tracked().await;
    refresh.unwrap().await.unwrap();

    assert_eq!(cached, remote);
    assert_eq!(engine.picklist().snapshot(), Some(remote));
}

#[tokio::test]
async fn team_reads_degrade_to_empty_offline() {
    let gateway = Arc::new(FakeGateway::new());
    let engine = engine(&gateway);
    engine.save_entry(ScoutingEntry::new(EVENT, 1, 254)).await;
    assert_eq!(engine.entries_for_team(254).await.len(), 1);

    gateway.set_online(false);
    assert!(engine.entries_for_team(254).await.is_empty());
    assert_eq!(engine.pit_entry_for_team(254).await, None);
}

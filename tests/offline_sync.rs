mod common;

use common::fake_remote::{FailMode, FakeRemote, RemoteOp};
use common::{account, eventually, TestApp, ACCOUNT_A, ACCOUNT_B};
use pondkeeper_lib::application::services::INITIAL_LOAD;
use pondkeeper_lib::domain::entities::farm::Tank;
use pondkeeper_lib::domain::entities::offline::{
    NotificationLevel, SkipReason, SyncOutcome,
};
use pondkeeper_lib::domain::value_objects::{
    QueueOperation, RecordPayload, SyncQueueStatus, SyncStatus, TableName,
};
use pondkeeper_lib::AppError;
use serde_json::json;
use std::cell::Cell;

fn rename(name: &str) -> RecordPayload {
    RecordPayload::new(json!({ "name": name })).unwrap()
}

async fn tank_names(app: &TestApp, account_id: &str) -> Vec<String> {
    let repo = app.state.repository::<Tank>(Some(account(account_id)));
    let mut names: Vec<String> = repo
        .data()
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.fields.name)
        .collect();
    names.sort();
    names
}

async fn run_script(app: &TestApp) {
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    let nursery = repo.create(Tank::new("Nursery")).await.unwrap();
    let grow_out = repo.create(Tank::new("Grow-out")).await.unwrap();
    repo.create(Tank::new("Broodstock")).await.unwrap();
    repo.update(&nursery.id, rename("Nursery A")).await.unwrap();
    repo.remove(&grow_out.id).await.unwrap();
}

#[tokio::test]
async fn offline_edits_match_online_edits() {
    let offline = TestApp::start(false).await;
    let online = TestApp::start(true).await;

    run_script(&offline).await;
    run_script(&online).await;

    assert_eq!(tank_names(&offline, ACCOUNT_A).await, tank_names(&online, ACCOUNT_A).await);
    assert_eq!(offline.pending().await, 5);
    assert_eq!(online.pending().await, 0);
    assert_eq!(offline.remote.calls(RemoteOp::Upsert), 0);
}

#[tokio::test]
async fn pending_count_never_grows_while_draining() {
    let app = TestApp::start(false).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    for name in ["T1", "T2", "T3"] {
        repo.create(Tank::new(name)).await.unwrap();
    }
    let before = app.pending().await;
    assert_eq!(before, 3);

    app.remote.hold();
    app.go_online().await;
    eventually(|| async { app.remote.started() >= 1 }).await;
    assert!(app.pending().await <= before);

    app.remote.release();
    let last = &Cell::new(before);
    let app = &app;
    eventually(|| async move {
        let now = app.pending().await;
        assert!(now <= last.get(), "pending grew from {} to {now}", last.get());
        last.set(now);
        now == 0
    })
    .await;
    assert_eq!(app.remote.rows(TableName::Tanks).len(), 3);
}

#[tokio::test]
async fn replayed_create_leaves_one_remote_row() {
    let app = TestApp::start(false).await;
    let payload = RecordPayload::new(json!({
        "id": "tank-1",
        "account_id": ACCOUNT_A,
        "name": "Nursery",
        "syncStatus": "queued",
        "lastModified": 1
    }))
    .unwrap();
    app.remote.seed(TableName::Tanks, payload.without_sync_meta());

    for _ in 0..2 {
        app.state
            .sync_service
            .add_to_queue(
                QueueOperation::Create,
                TableName::Tanks,
                &account(ACCOUNT_A),
                payload.clone(),
            )
            .await
            .unwrap();
    }

    app.go_online().await;
    eventually(|| async { app.pending().await == 0 }).await;

    let rows = app.remote.rows(TableName::Tanks);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].get("syncStatus").is_none());
    assert_eq!(app.remote.calls(RemoteOp::Upsert), 2);
}

#[tokio::test]
async fn reconnect_drains_queue_and_settles_records() {
    let app = TestApp::start(false).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    let record = repo.create(Tank::new("Nursery")).await.unwrap();
    assert_eq!(record.sync_status, SyncStatus::Queued);
    assert_eq!(repo.data().await.unwrap()[0].sync_status, SyncStatus::Queued);

    app.go_online().await;
    eventually(|| async { app.pending().await == 0 }).await;
    eventually(|| async {
        repo.data().await.unwrap()[0].sync_status == SyncStatus::Synced
    })
    .await;

    let remote_rows = app.remote.rows(TableName::Tanks);
    assert_eq!(remote_rows.len(), 1);
    assert_eq!(remote_rows[0].record_id().unwrap(), record.id);
}

#[tokio::test]
async fn accounts_never_see_each_others_rows() {
    let app = TestApp::start(true).await;
    let repo_a = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    let repo_b = app.state.repository::<Tank>(Some(account(ACCOUNT_B)));

    let tank = repo_a.create(Tank::new("Nursery")).await.unwrap();
    assert!(repo_b.data().await.unwrap().is_empty());

    let err = repo_b.update(&tank.id, rename("Taken")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = repo_b.remove(&tank.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    repo_b.mount().await.unwrap();
    assert_eq!(tank_names(&app, ACCOUNT_A).await, vec!["Nursery".to_string()]);
    assert!(tank_names(&app, ACCOUNT_B).await.is_empty());
}

#[tokio::test]
async fn failed_delete_stays_queued_until_remote_recovers() {
    let app = TestApp::start(true).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    let tank = repo.create(Tank::new("Nursery")).await.unwrap();
    assert_eq!(app.pending().await, 0);

    app.remote.fail_with(Some(FailMode::Unavailable));
    repo.remove(&tank.id).await.unwrap();

    assert!(repo.data().await.unwrap().is_empty());
    let pending = app
        .state
        .sync_service
        .list_queue(SyncQueueStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].operation, QueueOperation::Delete);
    assert_eq!(pending[0].retry_count, 1);

    app.remote.fail_with(None);
    let outcome = app.state.sync_service.process_queue().await.unwrap();
    assert_eq!(outcome.result().unwrap().synced_count, 1);
    assert_eq!(app.pending().await, 0);
    assert_eq!(app.remote.calls(RemoteOp::Delete), 2);
    assert!(app.remote.rows(TableName::Tanks).is_empty());
}

#[tokio::test]
async fn rejected_create_is_dead_lettered_and_can_be_requeued() {
    let app = TestApp::start(true).await;
    let mut notifications = app.state.notifier.subscribe();
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));

    app.remote.fail_with(Some(FailMode::Denied));
    repo.create(Tank::new("Nursery")).await.unwrap();

    assert_eq!(repo.data().await.unwrap()[0].sync_status, SyncStatus::Failed);
    let status = app.state.sync_service.status().await.unwrap();
    assert_eq!(status.pending_count, 0);
    assert_eq!(status.dead_letter_count, 1);

    let mut saw_failure = false;
    while let Ok(notification) = notifications.try_recv() {
        saw_failure |= notification.level == NotificationLevel::Failure;
    }
    assert!(saw_failure);

    app.remote.fail_with(None);
    assert_eq!(app.state.sync_service.requeue_failed().await.unwrap(), 1);
    assert_eq!(repo.data().await.unwrap()[0].sync_status, SyncStatus::Synced);
    assert_eq!(app.remote.rows(TableName::Tanks).len(), 1);
}

#[tokio::test]
async fn refresh_keeps_dead_lettered_records() {
    let app = TestApp::start(true).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));

    app.remote.fail_with(Some(FailMode::Denied));
    let record = repo.create(Tank::new("Nursery")).await.unwrap();
    assert_eq!(repo.data().await.unwrap()[0].sync_status, SyncStatus::Failed);

    app.remote.fail_with(None);
    let report = repo.refresh().await.unwrap().unwrap();
    assert_eq!(report.tables[&TableName::Tanks].preserved, 1);

    let rows = repo.data().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, record.id);
    assert_eq!(rows[0].sync_status, SyncStatus::Failed);
    assert_eq!(app.state.sync_service.status().await.unwrap().dead_letter_count, 1);
}

#[tokio::test]
async fn change_recorded_mid_drain_is_replayed() {
    let app = TestApp::start(false).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    repo.create(Tank::new("Nursery")).await.unwrap();

    app.remote.hold();
    app.go_online().await;
    eventually(|| async { app.remote.started() >= 1 }).await;

    // the running drain owns the gate, so this only leaves a trigger behind
    repo.create(Tank::new("Grow-out")).await.unwrap();
    app.remote.release();

    eventually(|| async { app.pending().await == 0 }).await;
    assert_eq!(app.remote.calls(RemoteOp::Upsert), 2);
    assert_eq!(app.remote.rows(TableName::Tanks).len(), 2);
    eventually(|| async {
        repo.data()
            .await
            .unwrap()
            .iter()
            .all(|record| record.sync_status == SyncStatus::Synced)
    })
    .await;
}

#[tokio::test]
async fn connectivity_blips_replay_each_entry_once() {
    let app = TestApp::start(false).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
    repo.create(Tank::new("Nursery")).await.unwrap();

    app.remote.hold();
    app.go_online().await;
    eventually(|| async { app.remote.started() >= 1 }).await;

    let outcome = app.state.sync_service.process_queue().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::AlreadyRunning));

    app.go_offline().await;
    app.go_online().await;
    app.remote.release();

    eventually(|| async { app.pending().await == 0 }).await;
    eventually(|| async { !app.state.sync_service.status().await.unwrap().is_syncing }).await;
    assert_eq!(app.remote.calls(RemoteOp::Upsert), 1);
    assert_eq!(app.remote.rows(TableName::Tanks).len(), 1);
}

#[tokio::test]
async fn mount_hydrates_once_per_account() {
    let remote = FakeRemote::new();
    remote.seed(
        TableName::Tanks,
        RecordPayload::new(json!({ "id": "tank-1", "account_id": ACCOUNT_A, "name": "Nursery" }))
            .unwrap(),
    );
    remote.seed(
        TableName::Tanks,
        RecordPayload::new(json!({ "id": "tank-2", "account_id": ACCOUNT_B, "name": "Other" }))
            .unwrap(),
    );
    let app = TestApp::with_remote(true, remote).await;
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));

    app.remote.hold();
    let mounting = {
        let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));
        tokio::spawn(async move { repo.mount().await })
    };
    eventually(|| async { app.remote.started() >= 1 }).await;
    assert!(app.state.loading.is_loading(INITIAL_LOAD));

    app.remote.release();
    let report = mounting.await.unwrap().unwrap().unwrap();
    assert_eq!(report.total_upserted(), 1);
    assert!(!app.state.loading.is_loading(INITIAL_LOAD));
    assert_eq!(app.remote.calls(RemoteOp::Select), TableName::ALL.len());

    assert!(repo.mount().await.unwrap().is_some());
    assert!(repo.mount().await.unwrap().is_none());
    assert_eq!(app.remote.calls(RemoteOp::Select), 2 * TableName::ALL.len());

    let records = repo.data().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields.name, "Nursery");
    assert_eq!(records[0].sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn success_notifications_reflect_connectivity() {
    let app = TestApp::start(true).await;
    let mut notifications = app.state.notifier.subscribe();
    let repo = app.state.repository::<Tank>(Some(account(ACCOUNT_A)));

    repo.create(Tank::new("Nursery")).await.unwrap();
    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Success);
    assert!(notification.description.contains("and syncing"));

    app.go_offline().await;
    repo.create(Tank::new("Grow-out")).await.unwrap();
    let notification = notifications.recv().await.unwrap();
    assert!(notification.description.contains("offline"));
}

#[tokio::test]
async fn signed_out_repository_is_inert() {
    let app = TestApp::start(true).await;
    let repo = app.state.repository::<Tank>(None);

    assert!(repo.data().await.unwrap().is_empty());
    assert!(repo.mount().await.unwrap().is_none());
    assert!(repo.refresh().await.unwrap().is_none());
    let err = repo.create(Tank::new("Nursery")).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(app.remote.calls(RemoteOp::Select), 0);
    assert_eq!(app.pending().await, 0);
}

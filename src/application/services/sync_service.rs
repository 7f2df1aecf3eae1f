use crate::application::ports::{
    LocalMutation, LocalStore, NetworkStatus, Notifier, RemoteStore, SyncQueueStore,
};
use crate::domain::entities::offline::{
    HydrationReport, Notification, SkipReason, SyncOutcome, SyncQueueItem, SyncQueueItemDraft,
    SyncResult,
};
use crate::domain::value_objects::{
    AccountId, QueueOperation, RecordId, RecordPayload, SyncQueueId, SyncQueueStatus, SyncStatus,
    TableName,
};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use crate::shared::metrics::{ReplayMetrics, ReplayMetricsSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Exponential backoff with a dead-letter cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Wait before retry number `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncServiceStatus {
    pub is_syncing: bool,
    pub pending_count: u32,
    pub dead_letter_count: u32,
    pub last_sync: Option<i64>,
    pub metrics: ReplayMetricsSnapshot,
}

/// Drains the durable mutation queue against the remote store and hydrates the local cache.
pub struct SyncService {
    local: Arc<dyn LocalStore>,
    queue: Arc<dyn SyncQueueStore>,
    remote: Arc<dyn RemoteStore>,
    network: NetworkStatus,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    auto_sync: bool,
    batch_size: u32,
    drain_gate: Mutex<()>,
    rerun_requested: AtomicBool,
    last_sync: RwLock<Option<i64>>,
    metrics: ReplayMetrics,
}

impl SyncService {
    pub fn new(
        local: Arc<dyn LocalStore>,
        queue: Arc<dyn SyncQueueStore>,
        remote: Arc<dyn RemoteStore>,
        network: NetworkStatus,
        notifier: Arc<dyn Notifier>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            local,
            queue,
            remote,
            network,
            notifier,
            policy: RetryPolicy::from_config(config),
            auto_sync: config.auto_sync,
            batch_size: config.batch_size.max(1),
            drain_gate: Mutex::new(()),
            rerun_requested: AtomicBool::new(false),
            last_sync: RwLock::new(None),
            metrics: ReplayMetrics::new(),
        }
    }

    pub fn auto_sync(&self) -> bool {
        self.auto_sync
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    /// Records a mutation durably, then drains right away when online.
    /// Only local-store failures surface; a failing drain is logged.
    pub async fn add_to_queue(
        &self,
        operation: QueueOperation,
        table: TableName,
        account_id: &AccountId,
        payload: RecordPayload,
    ) -> Result<SyncQueueId, AppError> {
        let record_id = payload.record_id().map_err(AppError::ValidationError)?;
        let draft = SyncQueueItemDraft::new(
            operation,
            table,
            record_id.clone(),
            account_id.clone(),
            payload,
            self.policy.max_retries,
        );
        let queue_id = self.queue.enqueue(draft).await?;
        tracing::debug!(
            target: "sync::queue",
            queue_id = %queue_id,
            operation = %operation,
            table = %table,
            record_id = %record_id,
            "mutation queued"
        );

        self.drain_if_online().await;
        Ok(queue_id)
    }

    /// Writes a local change and its queue entry in one transaction, then drains when
    /// online. Returns the row as stored.
    pub async fn record_mutation(
        &self,
        table: TableName,
        account_id: &AccountId,
        mutation: LocalMutation,
    ) -> Result<RecordPayload, AppError> {
        let operation = mutation.operation();
        let committed = self
            .local
            .commit_mutation(table, account_id, mutation, self.policy.max_retries)
            .await?;
        tracing::debug!(
            target: "sync::queue",
            queue_id = %committed.queue_id,
            operation = %operation,
            table = %table,
            "local change committed and queued"
        );

        self.drain_if_online().await;
        Ok(committed.row)
    }

    async fn drain_if_online(&self) {
        if self.auto_sync && self.network.is_online() {
            if let Err(err) = self.process_queue().await {
                tracing::warn!(target: "sync::queue", error = %err, "drain after enqueue failed");
            }
        }
    }

    /// Replays pending entries in FIFO order. One drain runs at a time; a trigger that
    /// arrives mid-drain is folded into one extra pass by the running drain.
    pub async fn process_queue(&self) -> Result<SyncOutcome, AppError> {
        let mut total: Option<SyncResult> = None;
        loop {
            if !self.network.is_online() {
                return Ok(match total {
                    Some(total) => SyncOutcome::Completed(total),
                    None => SyncOutcome::Skipped(SkipReason::Offline),
                });
            }
            let Ok(guard) = self.drain_gate.try_lock() else {
                self.rerun_requested.store(true, Ordering::SeqCst);
                tracing::debug!(target: "sync::queue", "drain already running, coalescing trigger");
                return Ok(match total {
                    Some(total) => SyncOutcome::Completed(total),
                    None => SyncOutcome::Skipped(SkipReason::AlreadyRunning),
                });
            };

            let run = self.drain_locked().await?;
            drop(guard);
            total.get_or_insert_with(SyncResult::default).absorb(run);

            // a trigger that lost the race for the gate after our last check
            if !self.rerun_requested.load(Ordering::SeqCst) {
                break;
            }
        }

        Ok(SyncOutcome::Completed(total.unwrap_or_default()))
    }

    /// Runs passes until nothing new arrives. Caller holds `drain_gate`.
    async fn drain_locked(&self) -> Result<SyncResult, AppError> {
        let mut total = SyncResult::default();
        loop {
            self.rerun_requested.store(false, Ordering::SeqCst);
            let (pass, saturated) = self.drain_pass().await?;
            let progressed = pass.synced_count + pass.dead_lettered_count > 0;
            total.absorb(pass);

            let rerun = self.rerun_requested.swap(false, Ordering::SeqCst);
            if !(rerun || (saturated && progressed)) || !self.network.is_online() {
                break;
            }
        }

        *self.last_sync.write().await = Some(Utc::now().timestamp_millis());
        tracing::info!(
            target: "sync::queue",
            synced = total.synced_count,
            failed = total.failed_count,
            dead_lettered = total.dead_lettered_count,
            deferred = total.deferred_count,
            pending = total.pending_count,
            "sync queue drained"
        );
        Ok(total)
    }

    /// Makes every pending entry due again, then drains.
    pub async fn process_after_reconnect(&self) -> Result<SyncOutcome, AppError> {
        let reset = self.queue.reset_backoff().await?;
        if reset > 0 {
            tracing::debug!(target: "sync::queue", reset, "backoff cleared after reconnect");
        }
        self.process_queue().await
    }

    async fn drain_pass(&self) -> Result<(SyncResult, bool), AppError> {
        let items = self.queue.pending_items(self.batch_size).await?;
        let saturated = items.len() as u64 >= u64::from(self.batch_size);
        let now = Utc::now();
        let mut blocked: HashSet<(TableName, RecordId)> = HashSet::new();
        let mut result = SyncResult::default();

        for item in items {
            if !self.network.is_online() {
                tracing::info!(target: "sync::queue", "went offline mid-drain, stopping");
                break;
            }

            let key = item.record_key();
            if blocked.contains(&key) || !item.is_due(now) {
                result.deferred_count += 1;
                blocked.insert(key);
                continue;
            }

            match self.replay(&item).await {
                Ok(()) => {
                    self.queue.remove(item.id).await?;
                    self.metrics.record_replayed();
                    result.synced_count += 1;
                    self.settle_local(&item).await?;
                    tracing::debug!(
                        target: "sync::queue",
                        queue_id = %item.id,
                        operation = %item.operation,
                        table = %item.table,
                        record_id = %item.record_id,
                        "replayed"
                    );
                }
                Err(err) if err.is_retryable() && !item.is_last_attempt() => {
                    let attempt = item.retry_count + 1;
                    let next = next_attempt_at(now, self.policy.delay_for(attempt));
                    self.queue
                        .record_failure(item.id, attempt, next, &err.to_string())
                        .await?;
                    self.metrics.record_retry();
                    result.failed_count += 1;
                    blocked.insert(key);
                    tracing::warn!(
                        target: "sync::queue",
                        queue_id = %item.id,
                        table = %item.table,
                        record_id = %item.record_id,
                        attempt,
                        error = %err,
                        "replay failed, will retry"
                    );
                }
                Err(err) => {
                    self.dead_letter(&item, &err).await?;
                    result.dead_lettered_count += 1;
                    blocked.insert(key);
                }
            }
        }

        result.pending_count = self.queue.count(SyncQueueStatus::Pending).await?;
        Ok((result, saturated))
    }

    async fn replay(&self, item: &SyncQueueItem) -> Result<(), AppError> {
        match item.operation {
            QueueOperation::Create => {
                self.remote
                    .upsert(item.table, std::slice::from_ref(&item.payload))
                    .await
            }
            QueueOperation::Update => {
                self.remote
                    .update(item.table, &item.account_id, &item.record_id, &item.payload)
                    .await
            }
            QueueOperation::Delete => {
                self.remote
                    .delete(item.table, &item.account_id, &item.record_id)
                    .await
            }
        }
    }

    async fn settle_local(&self, item: &SyncQueueItem) -> Result<(), AppError> {
        if item.operation == QueueOperation::Delete {
            return Ok(());
        }
        if self.queue.has_pending_for(item.table, &item.record_id).await? {
            return Ok(());
        }
        self.local
            .set_sync_status(item.table, &item.record_id, SyncStatus::Synced)
            .await
    }

    async fn dead_letter(&self, item: &SyncQueueItem, err: &AppError) -> Result<(), AppError> {
        self.queue.mark_dead_letter(item.id, &err.to_string()).await?;
        self.metrics.record_dead_letter();
        self.local
            .set_sync_status(item.table, &item.record_id, SyncStatus::Failed)
            .await?;

        tracing::error!(
            target: "sync::queue",
            queue_id = %item.id,
            operation = %item.operation,
            table = %item.table,
            record_id = %item.record_id,
            error = %err,
            "mutation dead-lettered"
        );
        self.notifier.notify(Notification::failure(
            Some(item.table),
            format!("{} not synced", item.table.label()),
            format!(
                "The server did not accept this {} {}: {err}",
                item.table.label().to_lowercase(),
                item.operation
            ),
        ));
        Ok(())
    }

    /// Pulls every table for the account. All fetches complete before anything is
    /// written; rows with a pending mutation keep their local version.
    pub async fn download_user_data(
        &self,
        account_id: &AccountId,
    ) -> Result<HydrationReport, AppError> {
        let mut fetched = Vec::with_capacity(TableName::ALL.len());
        for table in TableName::ALL {
            let mut rows = self.remote.select(table, account_id).await.map_err(|err| {
                tracing::error!(
                    target: "sync::hydrate",
                    table = %table,
                    error = %err,
                    "download failed"
                );
                err
            })?;
            let now = Utc::now().timestamp_millis();
            for row in &mut rows {
                row.set_sync_meta(SyncStatus::Synced, now);
            }
            fetched.push((table, rows));
        }

        let mut report = HydrationReport::default();
        for (table, rows) in fetched {
            let stats = self
                .local
                .replace_account_rows(table, account_id, rows)
                .await?;
            report.tables.insert(table, stats);
        }

        tracing::info!(
            target: "sync::hydrate",
            account_id = %account_id,
            upserted = report.total_upserted(),
            preserved = report.total_preserved(),
            "local store hydrated"
        );
        Ok(report)
    }

    pub async fn status(&self) -> Result<SyncServiceStatus, AppError> {
        Ok(SyncServiceStatus {
            is_syncing: self.drain_gate.try_lock().is_err(),
            pending_count: self.queue.count(SyncQueueStatus::Pending).await?,
            dead_letter_count: self.queue.count(SyncQueueStatus::Failed).await?,
            last_sync: *self.last_sync.read().await,
            metrics: self.metrics.snapshot(),
        })
    }

    pub async fn list_queue(&self, status: SyncQueueStatus) -> Result<Vec<SyncQueueItem>, AppError> {
        self.queue.list(status).await
    }

    /// Gives dead-lettered entries a fresh retry budget and marks their records queued again.
    pub async fn requeue_failed(&self) -> Result<u32, AppError> {
        let failed = self.queue.list(SyncQueueStatus::Failed).await?;
        let requeued = self.queue.requeue_failed().await?;
        for item in &failed {
            if item.operation != QueueOperation::Delete {
                self.local
                    .set_sync_status(item.table, &item.record_id, SyncStatus::Queued)
                    .await?;
            }
        }
        tracing::info!(target: "sync::queue", requeued, "dead-lettered entries requeued");

        if requeued > 0 && self.auto_sync && self.network.is_online() {
            self.process_queue().await?;
        }
        Ok(requeued)
    }
}

fn next_attempt_at(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

use super::loading_tracker::{LoadingTracker, INITIAL_LOAD, SYNC};
use super::sync_service::SyncService;
use crate::application::ports::{LocalMutation, LocalStore, Notifier};
use crate::domain::entities::farm::FarmEntity;
use crate::domain::entities::offline::{HydrationReport, Notification, Record};
use crate::domain::value_objects::offline::payload::{ACCOUNT_ID_KEY, ID_KEY};
use crate::domain::value_objects::{AccountId, RecordId, RecordPayload, SyncStatus, TableName};
use crate::shared::error::AppError;
use chrono::Utc;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

async fn load_records<T: FarmEntity>(
    local: &dyn LocalStore,
    account_id: Option<&AccountId>,
) -> Result<Vec<Record<T>>, AppError> {
    let Some(account_id) = account_id else {
        return Ok(Vec::new());
    };

    let rows = local.list(T::TABLE, account_id).await?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match Record::<T>::from_payload(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(table = %T::TABLE, error = %err, "skipping undecodable row");
            }
        }
    }
    Ok(records)
}

/// Reactive view of one table for one account. Re-evaluates whenever the table changes.
pub struct LiveQuery<T> {
    local: Arc<dyn LocalStore>,
    account_id: Option<AccountId>,
    revisions: watch::Receiver<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FarmEntity> LiveQuery<T> {
    pub async fn current(&mut self) -> Result<Vec<Record<T>>, AppError> {
        self.revisions.borrow_and_update();
        load_records(self.local.as_ref(), self.account_id.as_ref()).await
    }

    /// Waits for the next committed change to the table, then returns the fresh rows.
    pub async fn changed(&mut self) -> Result<Vec<Record<T>>, AppError> {
        self.revisions
            .changed()
            .await
            .map_err(|_| AppError::Internal("local store closed".to_string()))?;
        self.current().await
    }
}

/// Per-table façade: live data plus optimistic mutations that are queued for sync.
pub struct OfflineRepository<T: FarmEntity> {
    local: Arc<dyn LocalStore>,
    sync: Arc<SyncService>,
    loading: LoadingTracker,
    notifier: Arc<dyn Notifier>,
    account_id: Option<AccountId>,
    initialized_for: Mutex<Option<AccountId>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FarmEntity> OfflineRepository<T> {
    pub fn new(
        local: Arc<dyn LocalStore>,
        sync: Arc<SyncService>,
        loading: LoadingTracker,
        notifier: Arc<dyn Notifier>,
        account_id: Option<AccountId>,
    ) -> Self {
        Self {
            local,
            sync,
            loading,
            notifier,
            account_id,
            initialized_for: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    pub fn table(&self) -> TableName {
        T::TABLE
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    /// Current rows for the bound account; empty when no account is set.
    pub async fn data(&self) -> Result<Vec<Record<T>>, AppError> {
        load_records(self.local.as_ref(), self.account_id.as_ref()).await
    }

    pub fn live(&self) -> LiveQuery<T> {
        LiveQuery {
            local: Arc::clone(&self.local),
            account_id: self.account_id.clone(),
            revisions: self.local.subscribe(T::TABLE),
            _marker: PhantomData,
        }
    }

    /// First-mount hydration. Downloads once per account while online; later calls
    /// return `None` without touching the remote.
    pub async fn mount(&self) -> Result<Option<HydrationReport>, AppError> {
        let Some(account_id) = self.account_id.as_ref() else {
            return Ok(None);
        };
        if !self.sync.network().is_online() {
            return Ok(None);
        }

        let mut initialized = self.initialized_for.lock().await;
        if initialized.as_ref() == Some(account_id) {
            return Ok(None);
        }

        let _loading = self.loading.begin(INITIAL_LOAD);
        match self.sync.download_user_data(account_id).await {
            Ok(report) => {
                *initialized = Some(account_id.clone());
                Ok(Some(report))
            }
            Err(err) => {
                self.notifier.notify(Notification::failure(
                    Some(T::TABLE),
                    "Initial load failed",
                    format!("Could not load {} data: {err}", self.label_lower()),
                ));
                Err(err)
            }
        }
    }

    pub async fn create(&self, fields: T) -> Result<Record<T>, AppError> {
        let account_id = self.require_account("create")?;
        let record = Record::new_queued(account_id.clone(), fields, Utc::now().timestamp_millis());

        match self.create_inner(&account_id, &record).await {
            Ok(()) => {
                self.notify_success("created");
                Ok(record)
            }
            Err(err) => {
                self.notify_failure("create", &err);
                Err(err)
            }
        }
    }

    async fn create_inner(&self, account_id: &AccountId, record: &Record<T>) -> Result<(), AppError> {
        let payload = record.to_payload()?;
        self.sync
            .record_mutation(T::TABLE, account_id, LocalMutation::Insert(payload))
            .await?;
        Ok(())
    }

    /// Shallow-merges `patch` into the stored row. `id` and `account_id` in the patch are ignored.
    pub async fn update(&self, id: &RecordId, patch: RecordPayload) -> Result<Record<T>, AppError> {
        let account_id = self.require_account("update")?;

        match self.update_inner(&account_id, id, patch).await {
            Ok(record) => {
                self.notify_success("updated");
                Ok(record)
            }
            Err(err) => {
                self.notify_failure("update", &err);
                Err(err)
            }
        }
    }

    async fn update_inner(
        &self,
        account_id: &AccountId,
        id: &RecordId,
        mut patch: RecordPayload,
    ) -> Result<Record<T>, AppError> {
        let existing = self.owned_row(account_id, id).await?;

        patch.remove(ID_KEY);
        patch.remove(ACCOUNT_ID_KEY);
        patch.set_sync_meta(SyncStatus::Queued, Utc::now().timestamp_millis());

        let mut candidate = existing;
        candidate.merge(&patch);
        Record::<T>::from_payload(candidate)
            .map_err(|err| AppError::InvalidInput(err.to_string()))?;

        let merged = self
            .sync
            .record_mutation(
                T::TABLE,
                account_id,
                LocalMutation::Patch {
                    id: id.clone(),
                    patch,
                },
            )
            .await?;
        Record::<T>::from_payload(merged)
    }

    pub async fn remove(&self, id: &RecordId) -> Result<(), AppError> {
        let account_id = self.require_account("delete")?;

        match self.remove_inner(&account_id, id).await {
            Ok(()) => {
                self.notify_success("deleted");
                Ok(())
            }
            Err(err) => {
                self.notify_failure("delete", &err);
                Err(err)
            }
        }
    }

    async fn remove_inner(&self, account_id: &AccountId, id: &RecordId) -> Result<(), AppError> {
        self.owned_row(account_id, id).await?;
        self.sync
            .record_mutation(T::TABLE, account_id, LocalMutation::Remove(id.clone()))
            .await?;
        Ok(())
    }

    /// Manual re-download. `None` when offline or signed out.
    pub async fn refresh(&self) -> Result<Option<HydrationReport>, AppError> {
        let Some(account_id) = self.account_id.as_ref() else {
            return Ok(None);
        };
        if !self.sync.network().is_online() {
            return Ok(None);
        }

        let _loading = self.loading.begin(SYNC);
        match self.sync.download_user_data(account_id).await {
            Ok(report) => {
                self.notifier.notify(Notification::success(
                    Some(T::TABLE),
                    "Data refreshed",
                    format!("Latest {} data downloaded", self.label_lower()),
                ));
                Ok(Some(report))
            }
            Err(err) => {
                self.notifier.notify(Notification::failure(
                    Some(T::TABLE),
                    "Refresh failed",
                    format!("Could not refresh {} data: {err}", self.label_lower()),
                ));
                Err(err)
            }
        }
    }

    async fn owned_row(&self, account_id: &AccountId, id: &RecordId) -> Result<RecordPayload, AppError> {
        let row = self.local.get(T::TABLE, id).await?;
        match row {
            Some(row) if row.account_id().ok().as_ref() == Some(account_id) => Ok(row),
            _ => Err(AppError::NotFound(format!("{} {id}", T::TABLE.label()))),
        }
    }

    fn require_account(&self, action: &str) -> Result<AccountId, AppError> {
        match &self.account_id {
            Some(account_id) => Ok(account_id.clone()),
            None => {
                let err = AppError::Unauthorized(format!(
                    "cannot {action} a {} without a signed-in account",
                    self.label_lower()
                ));
                self.notify_failure(action, &err);
                Err(err)
            }
        }
    }

    fn label_lower(&self) -> String {
        T::TABLE.label().to_lowercase()
    }

    fn notify_success(&self, verb: &str) {
        let label = T::TABLE.label();
        let description = if self.sync.network().is_online() {
            format!("{label} {verb} and syncing")
        } else {
            format!("{label} {verb} offline, it will sync when you reconnect")
        };
        self.notifier.notify(Notification::success(
            Some(T::TABLE),
            format!("{label} {verb}"),
            description,
        ));
    }

    fn notify_failure(&self, action: &str, err: &AppError) {
        self.notifier.notify(Notification::failure(
            Some(T::TABLE),
            format!("Failed to {action} {}", self.label_lower()),
            err.to_string(),
        ));
    }
}

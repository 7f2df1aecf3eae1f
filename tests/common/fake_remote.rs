use async_trait::async_trait;
use pondkeeper_lib::application::ports::RemoteStore;
use pondkeeper_lib::domain::value_objects::{AccountId, RecordId, RecordPayload, TableName};
use pondkeeper_lib::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Upsert,
    Update,
    Delete,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Unavailable,
    Denied,
}

/// In-memory stand-in for the hosted table API.
pub struct FakeRemote {
    rows: Mutex<HashMap<(TableName, String), RecordPayload>>,
    calls: Mutex<HashMap<RemoteOp, usize>>,
    fail: Mutex<Option<FailMode>>,
    held: watch::Sender<bool>,
    started: AtomicUsize,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            fail: Mutex::new(None),
            held: watch::channel(false).0,
            started: AtomicUsize::new(0),
        }
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: TableName, row: RecordPayload) {
        let id = row.record_id().unwrap().to_string();
        self.rows.lock().unwrap().insert((table, id), row);
    }

    pub fn rows(&self, table: TableName) -> Vec<RecordPayload> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|((t, _), _)| *t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    pub fn calls(&self, op: RemoteOp) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, mode: Option<FailMode>) {
        *self.fail.lock().unwrap() = mode;
    }

    /// Calls block after registering until `release` is called.
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    async fn enter(&self, op: RemoteOp) -> Result<(), AppError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        match *self.fail.lock().unwrap() {
            Some(FailMode::Unavailable) => Err(AppError::RemoteUnavailable("500".into())),
            Some(FailMode::Denied) => Err(AppError::PermissionDenied("403".into())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn upsert(&self, table: TableName, rows: &[RecordPayload]) -> Result<(), AppError> {
        self.enter(RemoteOp::Upsert).await?;
        let mut stored = self.rows.lock().unwrap();
        for row in rows {
            let id = row.record_id().map_err(AppError::ValidationError)?.to_string();
            stored
                .entry((table, id))
                .and_modify(|existing| existing.merge(&row.without_sync_meta()))
                .or_insert_with(|| row.without_sync_meta());
        }
        Ok(())
    }

    async fn update(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
        fields: &RecordPayload,
    ) -> Result<(), AppError> {
        self.enter(RemoteOp::Update).await?;
        let mut stored = self.rows.lock().unwrap();
        if let Some(existing) = stored.get_mut(&(table, id.to_string())) {
            if existing.account_id().ok().as_ref() == Some(account_id) {
                existing.merge(&fields.without_sync_meta());
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        table: TableName,
        account_id: &AccountId,
        id: &RecordId,
    ) -> Result<(), AppError> {
        self.enter(RemoteOp::Delete).await?;
        let mut stored = self.rows.lock().unwrap();
        let key = (table, id.to_string());
        let owned = stored
            .get(&key)
            .map(|row| row.account_id().ok().as_ref() == Some(account_id))
            .unwrap_or(false);
        if owned {
            stored.remove(&key);
        }
        Ok(())
    }

    async fn select(
        &self,
        table: TableName,
        account_id: &AccountId,
    ) -> Result<Vec<RecordPayload>, AppError> {
        self.enter(RemoteOp::Select).await?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| row.account_id().ok().as_ref() == Some(account_id))
            .collect())
    }
}

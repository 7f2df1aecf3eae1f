use crate::domain::value_objects::TableName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tally of one `process_queue` run (possibly several coalesced passes).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResult {
    pub synced_count: u32,
    pub failed_count: u32,
    pub dead_lettered_count: u32,
    /// Entries skipped because they are backing off or wait behind an earlier entry for the same record.
    pub deferred_count: u32,
    /// Pending entries left once the run finished.
    pub pending_count: u32,
}

impl SyncResult {
    pub fn absorb(&mut self, pass: SyncResult) {
        self.synced_count += pass.synced_count;
        self.failed_count += pass.failed_count;
        self.dead_lettered_count += pass.dead_lettered_count;
        self.deferred_count = pass.deferred_count;
        self.pending_count = pass.pending_count;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    AlreadyRunning,
    AutoSyncDisabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed(SyncResult),
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub fn result(&self) -> Option<&SyncResult> {
        match self {
            SyncOutcome::Completed(result) => Some(result),
            SyncOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableHydration {
    pub upserted: u32,
    pub removed: u32,
    /// Rows left untouched because a local mutation is still queued for them.
    pub preserved: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HydrationReport {
    pub tables: BTreeMap<TableName, TableHydration>,
}

impl HydrationReport {
    pub fn total_upserted(&self) -> u32 {
        self.tables.values().map(|t| t.upserted).sum()
    }

    pub fn total_preserved(&self) -> u32 {
        self.tables.values().map(|t| t.preserved).sum()
    }
}

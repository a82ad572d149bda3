use std::collections::HashMap;

use crate::error::StoreError;
use crate::types::{DomainRecord, RecordKind};

/// Row counts per record kind, for status output and test assertions.
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    pub rows_by_kind: HashMap<RecordKind, u64>,
}

impl StoreStats {
    pub fn rows(&self, kind: RecordKind) -> u64 {
        self.rows_by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_rows(&self) -> u64 {
        self.rows_by_kind.values().sum()
    }
}

/// Durable sink for batches of domain records. The batched writer is the
/// only production caller.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist one buffer's worth of same-kind records as a single
    /// all-or-nothing write. Writes upsert by each kind's key, so
    /// re-ingestion overwrites rather than duplicates.
    ///
    /// Every record in `records` must be of `kind`; the batch is rejected
    /// otherwise. An empty batch is a no-op.
    async fn write_batch(
        &self,
        kind: RecordKind,
        records: &[DomainRecord],
    ) -> Result<(), StoreError>;

    /// Summary row counts per record kind.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::RecordStore;
use crate::types::{Account, Commit, CommitParent, DomainRecord, RecordKind};

/// Default per-kind buffer capacity before a synchronous flush.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Type-routed batched writer.
///
/// Accepts a heterogeneous stream of domain records, buffers them per
/// [`RecordKind`], and flushes each buffer to the store when it reaches
/// capacity. One writer instance belongs to exactly one ingestion run and
/// one producer; `&mut self` on every mutating operation enforces that.
///
/// A flush is all-or-nothing for the one buffer being flushed; there is no
/// cross-kind transaction. Callers must invoke [`close`](Self::close) on
/// every exit path or the unflushed tail of each buffer is lost.
pub struct BatchedWriter {
    store: Arc<dyn RecordStore>,
    batch_size: usize,
    buffers: HashMap<RecordKind, Vec<DomainRecord>>,
    closed: bool,
}

impl std::fmt::Debug for BatchedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchedWriter")
            .field("batch_size", &self.batch_size)
            .field("buffered_kinds", &self.buffers.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl BatchedWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_batch_size(store, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(store: Arc<dyn RecordStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            buffers: HashMap::new(),
            closed: false,
        }
    }

    /// Append one record, routed to its kind's buffer.
    ///
    /// A `Commit` record first synthesizes an [`Account`] from its author
    /// fields and appends that to the Account buffer; downstream consumers
    /// expect author identities to be resolvable wherever a commit
    /// reference exists. If the Account append (or the flush it triggers)
    /// fails, the Commit is not buffered and the error is returned.
    ///
    /// When a buffer reaches capacity it is flushed synchronously. On flush
    /// failure the triggering record stays buffered; retry safety is
    /// undefined at this layer and callers should treat the run as failed.
    pub async fn append(&mut self, record: DomainRecord) -> crate::error::Result<()> {
        if self.closed {
            return Err(StoreError::WriterClosed.into());
        }
        match record {
            DomainRecord::Commit(commit) => self.append_commit(commit).await,
            other => {
                self.push(other).await?;
                Ok(())
            }
        }
    }

    async fn append_commit(&mut self, commit: Commit) -> crate::error::Result<()> {
        let account = Account::from_commit(&commit);
        self.push(account.into()).await?;
        self.push(commit.into()).await?;
        Ok(())
    }

    /// Append a commit's parent edges, in input order.
    ///
    /// An empty edge list is a valid terminal state for a root commit and
    /// returns success without touching any buffer. The first append
    /// failure aborts the remaining edges. Like every other append, this
    /// is rejected after [`close`](Self::close).
    pub async fn append_commit_parents(
        &mut self,
        edges: Vec<CommitParent>,
    ) -> crate::error::Result<()> {
        if self.closed {
            return Err(StoreError::WriterClosed.into());
        }
        if edges.is_empty() {
            return Ok(());
        }
        for edge in edges {
            self.push(edge.into()).await?;
        }
        Ok(())
    }

    /// Flush every buffer that still holds records and seal the writer.
    ///
    /// Buffers flush in [`RecordKind::ALL`] order. All flushes are
    /// attempted even after one fails, so one kind's storage failure does
    /// not silently drop another kind's durable data; the first error
    /// encountered is returned. Appends after close are rejected.
    pub async fn close(&mut self) -> crate::error::Result<()> {
        self.closed = true;
        let mut first_err: Option<StoreError> = None;

        for kind in RecordKind::ALL {
            match self.flush_kind(kind).await {
                Ok(()) => {}
                Err(e) => {
                    if first_err.is_some() {
                        warn!(kind = %kind, error = %e, "Additional flush failure during close");
                    } else {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    async fn push(&mut self, record: DomainRecord) -> Result<(), StoreError> {
        let kind = record.kind();
        let buffer = self.buffers.entry(kind).or_default();
        buffer.push(record);
        if buffer.len() >= self.batch_size {
            self.flush_kind(kind).await?;
        }
        Ok(())
    }

    /// Write one buffer as a single batch and clear it on success. On
    /// failure the buffer's contents remain in place, not rolled back.
    async fn flush_kind(&mut self, kind: RecordKind) -> Result<(), StoreError> {
        let Some(buffer) = self.buffers.get(&kind) else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }
        let rows = buffer.len();
        self.store.write_batch(kind, buffer).await?;
        debug!(kind = %kind, rows, "Batch flushed");
        if let Some(buffer) = self.buffers.get_mut(&kind) {
            buffer.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::error::GitlakeError;
    use crate::store::StoreStats;
    use crate::types::CommitFile;

    /// Fake store that logs every flush as (kind, batch length).
    #[derive(Default)]
    struct RecordingStore {
        flushes: Mutex<Vec<(RecordKind, usize)>>,
    }

    impl RecordingStore {
        fn flushes(&self) -> Vec<(RecordKind, usize)> {
            self.flushes.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for RecordingStore {
        async fn write_batch(
            &self,
            kind: RecordKind,
            records: &[DomainRecord],
        ) -> Result<(), StoreError> {
            self.flushes.lock().unwrap().push((kind, records.len()));
            Ok(())
        }

        async fn stats(&self) -> Result<StoreStats, StoreError> {
            Ok(StoreStats::default())
        }
    }

    /// Fake store that fails every flush of one kind.
    struct FailingStore {
        fail_kind: RecordKind,
        attempts: Mutex<Vec<RecordKind>>,
    }

    impl FailingStore {
        fn new(fail_kind: RecordKind) -> Self {
            Self {
                fail_kind,
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for FailingStore {
        async fn write_batch(
            &self,
            kind: RecordKind,
            _records: &[DomainRecord],
        ) -> Result<(), StoreError> {
            self.attempts.lock().unwrap().push(kind);
            if kind == self.fail_kind {
                return Err(StoreError::Flush {
                    kind,
                    source: rusqlite::Error::InvalidQuery,
                });
            }
            Ok(())
        }

        async fn stats(&self) -> Result<StoreStats, StoreError> {
            Ok(StoreStats::default())
        }
    }

    fn make_commit(sha: &str, email: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            additions: 0,
            deletions: 0,
            author_name: "Ada".into(),
            author_email: email.to_string(),
            authored_date: Utc::now(),
            committer_name: "Ada".into(),
            committer_email: email.to_string(),
            committed_date: Utc::now(),
            message: "msg".into(),
        }
    }

    fn make_file(sha: &str, path: &str) -> CommitFile {
        CommitFile {
            commit_sha: sha.to_string(),
            file_path: path.to_string(),
            additions: 1,
            deletions: 0,
        }
    }

    #[tokio::test]
    async fn full_batch_flushes_exactly_once() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        for i in 0..100 {
            writer
                .append(make_file("sha", &format!("f{i}")).into())
                .await
                .unwrap();
        }
        assert_eq!(store.flushes(), vec![(RecordKind::CommitFile, 100)]);

        // The buffer emptied at the threshold, so close has nothing left.
        writer.close().await.unwrap();
        assert_eq!(store.flushes(), vec![(RecordKind::CommitFile, 100)]);
    }

    #[tokio::test]
    async fn partial_batch_flushes_only_at_close() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        for i in 0..42 {
            writer
                .append(make_file("sha", &format!("f{i}")).into())
                .await
                .unwrap();
        }
        assert!(store.flushes().is_empty(), "no flush below the threshold");

        writer.close().await.unwrap();
        assert_eq!(store.flushes(), vec![(RecordKind::CommitFile, 42)]);
    }

    #[tokio::test]
    async fn empty_parent_list_is_a_no_op() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        writer.append_commit_parents(Vec::new()).await.unwrap();
        writer.close().await.unwrap();
        assert!(store.flushes().is_empty(), "zero buffer and storage interaction");
    }

    #[tokio::test]
    async fn parent_edges_share_one_buffer() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        let edges: Vec<CommitParent> = (0..150)
            .map(|i| CommitParent {
                commit_sha: "merge".into(),
                parent_sha: format!("p{i}"),
            })
            .collect();
        writer.append_commit_parents(edges).await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(
            store.flushes(),
            vec![
                (RecordKind::CommitParent, 100),
                (RecordKind::CommitParent, 50)
            ]
        );
    }

    #[tokio::test]
    async fn commit_append_synthesizes_account_first() {
        let store = Arc::new(RecordingStore::default());
        // Batch size 1 makes each append flush immediately, exposing order.
        let mut writer =
            BatchedWriter::with_batch_size(Arc::clone(&store) as Arc<dyn RecordStore>, 1);

        writer
            .append(make_commit("aaa", "a@x.com").into())
            .await
            .unwrap();

        assert_eq!(
            store.flushes(),
            vec![(RecordKind::Account, 1), (RecordKind::Commit, 1)],
            "account must land before its commit"
        );
    }

    #[tokio::test]
    async fn duplicate_author_emails_yield_two_account_appends() {
        let store = Arc::new(RecordingStore::default());
        let mut writer =
            BatchedWriter::with_batch_size(Arc::clone(&store) as Arc<dyn RecordStore>, 1);

        writer
            .append(make_commit("aaa", "a@x.com").into())
            .await
            .unwrap();
        writer
            .append(make_commit("bbb", "a@x.com").into())
            .await
            .unwrap();

        let account_flushes = store
            .flushes()
            .into_iter()
            .filter(|(k, _)| *k == RecordKind::Account)
            .count();
        assert_eq!(account_flushes, 2, "same key twice, no fatal conflict");
    }

    #[tokio::test]
    async fn account_flush_failure_blocks_the_commit() {
        let store = Arc::new(FailingStore::new(RecordKind::Account));
        let mut writer =
            BatchedWriter::with_batch_size(Arc::clone(&store) as Arc<dyn RecordStore>, 1);

        let err = writer
            .append(make_commit("aaa", "a@x.com").into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GitlakeError::Store(StoreError::Flush {
                kind: RecordKind::Account,
                ..
            })
        ));

        // The commit must not have been buffered; closing attempts the
        // stuck Account buffer again but never a Commit batch.
        let _ = writer.close().await;
        let attempts = store.attempts.lock().unwrap().clone();
        assert!(!attempts.contains(&RecordKind::Commit));
    }

    #[tokio::test]
    async fn close_attempts_all_buffers_and_returns_first_error() {
        let store = Arc::new(FailingStore::new(RecordKind::CommitFile));
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        writer
            .append(make_commit("aaa", "a@x.com").into())
            .await
            .unwrap();
        writer.append(make_file("aaa", "src/lib.rs").into()).await.unwrap();
        writer
            .append_commit_parents(vec![CommitParent {
                commit_sha: "aaa".into(),
                parent_sha: "p".into(),
            }])
            .await
            .unwrap();

        let err = writer.close().await.unwrap_err();
        assert!(matches!(
            err,
            GitlakeError::Store(StoreError::Flush {
                kind: RecordKind::CommitFile,
                ..
            })
        ));

        // The failure must not have dropped the other kinds' flushes.
        let attempts = store.attempts.lock().unwrap().clone();
        assert!(attempts.contains(&RecordKind::Account));
        assert!(attempts.contains(&RecordKind::Commit));
        assert!(attempts.contains(&RecordKind::CommitParent));
    }

    #[tokio::test]
    async fn append_after_close_is_rejected() {
        let store = Arc::new(RecordingStore::default());
        let mut writer = BatchedWriter::new(Arc::clone(&store) as Arc<dyn RecordStore>);

        writer.close().await.unwrap();
        let err = writer
            .append(make_file("sha", "f").into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GitlakeError::Store(StoreError::WriterClosed)
        ));

        // The closed check is uniform: even an empty edge list, which is
        // a no-op on an open writer, is rejected.
        let err = writer.append_commit_parents(Vec::new()).await.unwrap_err();
        assert!(matches!(
            err,
            GitlakeError::Store(StoreError::WriterClosed)
        ));
    }

    #[tokio::test]
    async fn failed_flush_keeps_records_buffered() {
        let store = Arc::new(FailingStore::new(RecordKind::CommitFile));
        let mut writer =
            BatchedWriter::with_batch_size(Arc::clone(&store) as Arc<dyn RecordStore>, 2);

        writer.append(make_file("sha", "a").into()).await.unwrap();
        let err = writer.append(make_file("sha", "b").into()).await;
        assert!(err.is_err(), "threshold flush fails");

        // Close retries the same buffer: the records were not rolled back.
        let _ = writer.close().await;
        let attempts = store.attempts.lock().unwrap().clone();
        assert_eq!(attempts, vec![RecordKind::CommitFile, RecordKind::CommitFile]);
    }
}

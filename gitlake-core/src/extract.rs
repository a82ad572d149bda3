//! Extractor seam — the external collaborator that walks repository
//! history and feeds the batched writer.
//!
//! The walking and diffing algorithm itself lives outside this crate; this
//! module fixes the contract it must honor.

use std::time::Duration;

use crate::acquire::RepoHandle;
use crate::error::GitlakeError;
use crate::writer::BatchedWriter;

/// Statistics returned by an extractor after a run.
#[derive(Debug, Default)]
pub struct ExtractStats {
    pub commits: u64,
    pub refs: u64,
    pub files: u64,
    pub line_changes: u64,
    pub duration: Duration,
    /// Non-fatal per-commit failures, keyed by sha.
    pub errors: Vec<(String, GitlakeError)>,
}

/// Walks a resolved repository handle and appends domain records.
///
/// Implementations must emit every record causally before any record that
/// references it (a commit before its parent edges, file records after
/// their commit), are the sole caller of the writer's append operations,
/// and must call [`BatchedWriter::close`] exactly once when done —
/// including on early termination due to an error — or the buffered tail
/// of each record kind is silently lost.
#[async_trait::async_trait(?Send)]
pub trait RepoExtractor: Send + Sync {
    async fn extract(
        &self,
        handle: &RepoHandle,
        writer: &mut BatchedWriter,
    ) -> crate::error::Result<ExtractStats>;
}

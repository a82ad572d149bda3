use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::types::{DomainRecord, RecordKind};

use super::schema;
use super::traits::{RecordStore, StoreStats};

/// SQLite-backed implementation of [`RecordStore`].
///
/// One table per record kind; every write is an upsert on the kind's key,
/// so re-ingestion of the same history converges instead of duplicating.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("gitlake store mutex poisoned");

        // Performance pragmas (skip WAL for in-memory — it's auto)
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::Sqlite)?;

        // Try WAL mode — silently ignored for in-memory
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;

        conn.execute(
            "INSERT OR IGNORE INTO gitlake_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(())
    }

    /// Upsert a single record inside an open transaction.
    fn insert_record(tx: &rusqlite::Transaction<'_>, record: &DomainRecord) -> rusqlite::Result<()> {
        match record {
            DomainRecord::RepoCommit(rc) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO repo_commits (repo_id, commit_sha)
                     VALUES (?1, ?2)
                     ON CONFLICT(repo_id, commit_sha) DO NOTHING",
                )?;
                stmt.execute(params![rc.repo_id, rc.commit_sha])?;
            }
            DomainRecord::Account(account) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO accounts (email, full_name, user_name)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(email) DO UPDATE SET
                        full_name = excluded.full_name,
                        user_name = excluded.user_name",
                )?;
                stmt.execute(params![account.email, account.full_name, account.user_name])?;
            }
            DomainRecord::Commit(commit) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO commits (sha, additions, deletions, author_name, author_email,
                                          authored_date, committer_name, committer_email,
                                          committed_date, message)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(sha) DO UPDATE SET
                        additions = excluded.additions,
                        deletions = excluded.deletions,
                        author_name = excluded.author_name,
                        author_email = excluded.author_email,
                        authored_date = excluded.authored_date,
                        committer_name = excluded.committer_name,
                        committer_email = excluded.committer_email,
                        committed_date = excluded.committed_date,
                        message = excluded.message",
                )?;
                stmt.execute(params![
                    commit.sha,
                    commit.additions,
                    commit.deletions,
                    commit.author_name,
                    commit.author_email,
                    commit.authored_date.to_rfc3339(),
                    commit.committer_name,
                    commit.committer_email,
                    commit.committed_date.to_rfc3339(),
                    commit.message,
                ])?;
            }
            DomainRecord::GitRef(git_ref) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO refs (repo_id, name, commit_sha, ref_kind)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(repo_id, name) DO UPDATE SET
                        commit_sha = excluded.commit_sha,
                        ref_kind = excluded.ref_kind",
                )?;
                stmt.execute(params![
                    git_ref.repo_id,
                    git_ref.name,
                    git_ref.commit_sha,
                    git_ref.ref_kind.as_str(),
                ])?;
            }
            DomainRecord::CommitFile(file) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO commit_files (commit_sha, file_path, additions, deletions)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(commit_sha, file_path) DO UPDATE SET
                        additions = excluded.additions,
                        deletions = excluded.deletions",
                )?;
                stmt.execute(params![
                    file.commit_sha,
                    file.file_path,
                    file.additions,
                    file.deletions
                ])?;
            }
            DomainRecord::CommitFileComponent(component) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO commit_file_components (commit_sha, file_path, component)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(commit_sha, file_path) DO UPDATE SET
                        component = excluded.component",
                )?;
                stmt.execute(params![
                    component.commit_sha,
                    component.file_path,
                    component.component
                ])?;
            }
            DomainRecord::CommitLineChange(line) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO commit_line_changes (commit_sha, file_path, line_no_new,
                                                      line_no_old, old_file_path, hunk_num,
                                                      changed_type, line_content, author_name,
                                                      author_email, prev_commit)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT(commit_sha, file_path, line_no_new) DO UPDATE SET
                        line_no_old = excluded.line_no_old,
                        old_file_path = excluded.old_file_path,
                        hunk_num = excluded.hunk_num,
                        changed_type = excluded.changed_type,
                        line_content = excluded.line_content,
                        author_name = excluded.author_name,
                        author_email = excluded.author_email,
                        prev_commit = excluded.prev_commit",
                )?;
                stmt.execute(params![
                    line.commit_sha,
                    line.file_path,
                    line.line_no_new,
                    line.line_no_old,
                    line.old_file_path,
                    line.hunk_num,
                    line.changed_type.as_str(),
                    line.line_content,
                    line.author_name,
                    line.author_email,
                    line.prev_commit,
                ])?;
            }
            DomainRecord::CommitParent(edge) => {
                // Ancestry edges are append-only; a re-seen edge is a no-op.
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO commit_parents (commit_sha, parent_sha)
                     VALUES (?1, ?2)
                     ON CONFLICT(commit_sha, parent_sha) DO NOTHING",
                )?;
                stmt.execute(params![edge.commit_sha, edge.parent_sha])?;
            }
            DomainRecord::Snapshot(snapshot) => {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO snapshots (repo_id, source_url, captured_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(repo_id, source_url) DO UPDATE SET
                        captured_at = excluded.captured_at",
                )?;
                stmt.execute(params![
                    snapshot.repo_id,
                    snapshot.source_url,
                    snapshot.captured_at.to_rfc3339()
                ])?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    async fn write_batch(
        &self,
        kind: RecordKind,
        records: &[DomainRecord],
    ) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        for record in records {
            if record.kind() != kind {
                return Err(StoreError::KindMismatch {
                    expected: kind,
                    actual: record.kind(),
                });
            }
        }

        let conn = self.conn.lock().expect("gitlake store mutex poisoned");
        let flush_err = |source: rusqlite::Error| StoreError::Flush { kind, source };

        let tx = conn.unchecked_transaction().map_err(flush_err)?;
        for record in records {
            Self::insert_record(&tx, record).map_err(flush_err)?;
        }
        tx.commit().map_err(flush_err)?;

        tracing::debug!(kind = %kind, rows = records.len(), "Flushed batch");
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn.lock().expect("gitlake store mutex poisoned");
        let mut rows_by_kind = HashMap::new();
        for kind in RecordKind::ALL {
            let count: u64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", kind.table()), [], |row| {
                    row.get(0)
                })
                .map_err(StoreError::Sqlite)?;
            rows_by_kind.insert(kind, count);
        }
        Ok(StoreStats { rows_by_kind })
    }
}

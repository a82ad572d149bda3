/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for gitlake's `SQLite` database.
///
/// One table per record kind, keyed exactly as the domain model specifies.
/// Every key is a UNIQUE constraint so batch writes can upsert: re-ingesting
/// a commit overwrites its rows instead of duplicating them.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS gitlake_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Repository to commit associations
CREATE TABLE IF NOT EXISTS repo_commits (
    repo_id TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    PRIMARY KEY (repo_id, commit_sha)
);

-- Author identities derived from commit author fields
CREATE TABLE IF NOT EXISTS accounts (
    email TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    user_name TEXT NOT NULL
);

-- Commits
CREATE TABLE IF NOT EXISTS commits (
    sha TEXT PRIMARY KEY,
    additions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0,
    author_name TEXT NOT NULL,
    author_email TEXT NOT NULL,
    authored_date TEXT NOT NULL,
    committer_name TEXT NOT NULL,
    committer_email TEXT NOT NULL,
    committed_date TEXT NOT NULL,
    message TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_commits_author_email ON commits(author_email);

-- Branches and tags
CREATE TABLE IF NOT EXISTS refs (
    repo_id TEXT NOT NULL,
    name TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    ref_kind TEXT NOT NULL,
    PRIMARY KEY (repo_id, name)
);
CREATE INDEX IF NOT EXISTS idx_refs_commit ON refs(commit_sha);

-- Per-file change summaries
CREATE TABLE IF NOT EXISTS commit_files (
    commit_sha TEXT NOT NULL,
    file_path TEXT NOT NULL,
    additions INTEGER NOT NULL DEFAULT 0,
    deletions INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (commit_sha, file_path)
);
CREATE INDEX IF NOT EXISTS idx_commit_files_path ON commit_files(file_path);

-- Component labels on changed files
CREATE TABLE IF NOT EXISTS commit_file_components (
    commit_sha TEXT NOT NULL,
    file_path TEXT NOT NULL,
    component TEXT NOT NULL,
    PRIMARY KEY (commit_sha, file_path)
);

-- Per-line changes
CREATE TABLE IF NOT EXISTS commit_line_changes (
    commit_sha TEXT NOT NULL,
    file_path TEXT NOT NULL,
    line_no_new INTEGER NOT NULL,
    line_no_old INTEGER NOT NULL,
    old_file_path TEXT NOT NULL DEFAULT '',
    hunk_num INTEGER NOT NULL DEFAULT 0,
    changed_type TEXT NOT NULL,
    line_content TEXT NOT NULL DEFAULT '',
    author_name TEXT NOT NULL,
    author_email TEXT NOT NULL,
    prev_commit TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (commit_sha, file_path, line_no_new)
);
CREATE INDEX IF NOT EXISTS idx_line_changes_path ON commit_line_changes(file_path);

-- Commit ancestry edges (DAG)
CREATE TABLE IF NOT EXISTS commit_parents (
    commit_sha TEXT NOT NULL,
    parent_sha TEXT NOT NULL,
    PRIMARY KEY (commit_sha, parent_sha)
);
CREATE INDEX IF NOT EXISTS idx_commit_parents_parent ON commit_parents(parent_sha);

-- Extraction-run provenance
CREATE TABLE IF NOT EXISTS snapshots (
    repo_id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    PRIMARY KEY (repo_id, source_url)
);
";

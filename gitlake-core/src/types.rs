use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Record kinds ───────────────────────────────────────────────────

/// Closed enumeration of every domain record kind gitlake persists.
///
/// The batched writer keys its buffers by this tag, and the store maps each
/// kind to one durable table. Adding a kind means adding a variant here, a
/// `DomainRecord` variant, and a table in the schema — nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Association of a repository to a commit sha.
    RepoCommit,
    /// A derived author identity, keyed by email.
    Account,
    /// A single commit with author/committer metadata.
    Commit,
    /// A branch or tag pointing at a commit.
    GitRef,
    /// Per-file change summary within one commit.
    CommitFile,
    /// Component label attached to a changed file.
    CommitFileComponent,
    /// A single changed line within a file diff.
    CommitLineChange,
    /// A commit → parent edge in the history DAG.
    CommitParent,
    /// Extraction-run provenance metadata.
    Snapshot,
}

impl RecordKind {
    /// All kinds in declaration order. `BatchedWriter::close` flushes
    /// remaining buffers in exactly this order. Account precedes Commit so
    /// author identities land before the commits that reference them.
    pub const ALL: [Self; 9] = [
        Self::RepoCommit,
        Self::Account,
        Self::Commit,
        Self::GitRef,
        Self::CommitFile,
        Self::CommitFileComponent,
        Self::CommitLineChange,
        Self::CommitParent,
        Self::Snapshot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RepoCommit => "RepoCommit",
            Self::Account => "Account",
            Self::Commit => "Commit",
            Self::GitRef => "GitRef",
            Self::CommitFile => "CommitFile",
            Self::CommitFileComponent => "CommitFileComponent",
            Self::CommitLineChange => "CommitLineChange",
            Self::CommitParent => "CommitParent",
            Self::Snapshot => "Snapshot",
        }
    }

    /// Name of the durable table this kind maps to.
    pub fn table(self) -> &'static str {
        match self {
            Self::RepoCommit => "repo_commits",
            Self::Account => "accounts",
            Self::Commit => "commits",
            Self::GitRef => "refs",
            Self::CommitFile => "commit_files",
            Self::CommitFileComponent => "commit_file_components",
            Self::CommitLineChange => "commit_line_changes",
            Self::CommitParent => "commit_parents",
            Self::Snapshot => "snapshots",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Domain records ─────────────────────────────────────────────────

/// Association of a logical repository to a commit sha.
/// Keyed by (`repo_id`, `commit_sha`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCommit {
    pub repo_id: String,
    pub commit_sha: String,
}

/// A single commit. Keyed by `sha`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub additions: u32,
    pub deletions: u32,
    pub author_name: String,
    pub author_email: String,
    pub authored_date: DateTime<Utc>,
    pub committer_name: String,
    pub committer_email: String,
    pub committed_date: DateTime<Utc>,
    pub message: String,
}

/// Author identity derived from a commit's author fields, never walked
/// directly. Keyed by `email`; many commits converge on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub full_name: String,
    pub user_name: String,
}

impl Account {
    /// Derive an account from a commit's author fields.
    pub fn from_commit(commit: &Commit) -> Self {
        Self {
            email: commit.author_email.clone(),
            full_name: commit.author_name.clone(),
            user_name: commit.author_name.clone(),
        }
    }
}

/// Whether a ref is a branch or a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
        }
    }
}

/// A branch or tag pointing at a commit. Keyed by (`repo_id`, `name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    pub repo_id: String,
    pub name: String,
    pub commit_sha: String,
    pub ref_kind: RefKind,
}

/// Change summary for one file in one commit.
/// Keyed by (`commit_sha`, `file_path`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub commit_sha: String,
    pub file_path: String,
    pub additions: u32,
    pub deletions: u32,
}

/// Component classification attached to a changed file.
/// Keyed by (`commit_sha`, `file_path`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFileComponent {
    pub commit_sha: String,
    pub file_path: String,
    pub component: String,
}

/// How a line changed within a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangedType {
    Added,
    Removed,
    Context,
}

impl ChangedType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Context => "context",
        }
    }
}

/// A single changed line within a file diff.
/// Keyed by (`commit_sha`, `file_path`, `line_no_new`).
///
/// Author name/email are denormalized from the owning commit for query
/// convenience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitLineChange {
    pub commit_sha: String,
    pub file_path: String,
    pub line_no_new: u32,
    pub line_no_old: u32,
    /// Pre-rename path, when the file moved in this commit.
    pub old_file_path: String,
    pub hunk_num: u32,
    pub changed_type: ChangedType,
    pub line_content: String,
    pub author_name: String,
    pub author_email: String,
    /// Sha of the commit that previously touched this line, when known.
    pub prev_commit: String,
}

/// A commit → parent edge. Zero edges for a root commit, one for a normal
/// commit, two or more for a merge. Keyed by (`commit_sha`, `parent_sha`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitParent {
    pub commit_sha: String,
    pub parent_sha: String,
}

/// Provenance record for one extraction run. Keyed by (`repo_id`,
/// `source_url`), superseded on re-ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub repo_id: String,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

// ── Tagged record union ────────────────────────────────────────────

/// One typed unit of ingested data of any kind.
///
/// The writer routes records to per-kind buffers by matching on this enum
/// rather than by runtime type introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainRecord {
    RepoCommit(RepoCommit),
    Account(Account),
    Commit(Commit),
    GitRef(GitRef),
    CommitFile(CommitFile),
    CommitFileComponent(CommitFileComponent),
    CommitLineChange(CommitLineChange),
    CommitParent(CommitParent),
    Snapshot(Snapshot),
}

impl DomainRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::RepoCommit(_) => RecordKind::RepoCommit,
            Self::Account(_) => RecordKind::Account,
            Self::Commit(_) => RecordKind::Commit,
            Self::GitRef(_) => RecordKind::GitRef,
            Self::CommitFile(_) => RecordKind::CommitFile,
            Self::CommitFileComponent(_) => RecordKind::CommitFileComponent,
            Self::CommitLineChange(_) => RecordKind::CommitLineChange,
            Self::CommitParent(_) => RecordKind::CommitParent,
            Self::Snapshot(_) => RecordKind::Snapshot,
        }
    }
}

macro_rules! record_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for DomainRecord {
            fn from(record: $ty) -> Self {
                Self::$variant(record)
            }
        }
    };
}

record_from!(RepoCommit, RepoCommit);
record_from!(Account, Account);
record_from!(Commit, Commit);
record_from!(GitRef, GitRef);
record_from!(CommitFile, CommitFile);
record_from!(CommitFileComponent, CommitFileComponent);
record_from!(CommitLineChange, CommitLineChange);
record_from!(CommitParent, CommitParent);
record_from!(Snapshot, Snapshot);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_appears_in_all() {
        for kind in RecordKind::ALL {
            assert!(RecordKind::ALL.contains(&kind));
        }
        assert_eq!(RecordKind::ALL.len(), 9);
    }

    #[test]
    fn record_reports_its_kind() {
        let record: DomainRecord = CommitParent {
            commit_sha: "a".into(),
            parent_sha: "b".into(),
        }
        .into();
        assert_eq!(record.kind(), RecordKind::CommitParent);
    }

    #[test]
    fn account_derivation_uses_author_fields() {
        let commit = Commit {
            sha: "c0ffee".into(),
            additions: 1,
            deletions: 0,
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            authored_date: Utc::now(),
            committer_name: "Ada".into(),
            committer_email: "ada@example.com".into(),
            committed_date: Utc::now(),
            message: "initial".into(),
        };
        let account = Account::from_commit(&commit);
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.full_name, "Ada");
        assert_eq!(account.user_name, "Ada");
    }
}

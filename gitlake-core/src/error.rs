use crate::acquire::Strategy;
use crate::types::RecordKind;

/// Top-level gitlake error type.
///
/// All fallible operations in `gitlake-core` return
/// [`Result<T, GitlakeError>`](Result). Each variant wraps a layer-specific
/// error enum so callers can match on the source without losing type
/// information.
#[derive(thiserror::Error, Debug)]
pub enum GitlakeError {
    /// Error resolving a repository locator into a handle.
    #[error("Acquisition error: {0}")]
    Acquire(#[from] AcquireError),

    /// Error from the record store layer (batch flushes, `SQLite`).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the acquisition dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    /// Underlying git transport failed (auth, network, invalid path,
    /// corrupt repository), tagged with the strategy that produced it.
    #[error("{strategy} acquisition failed: {source}")]
    Git {
        /// Strategy that was executing when the failure occurred.
        strategy: Strategy,
        #[source]
        source: git2::Error,
    },

    /// Could not create the scratch directory that receives a clone.
    #[error("Clone workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    /// No acquisition strategy matched the locator.
    #[error("Unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    /// Acquisition options are malformed (blank locator, blank repo id).
    #[error("Invalid acquisition options: {0}")]
    InvalidOptions(String),
}

/// Errors from the record store and batched writer.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed outside a batch flush.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A batch flush failed for one record kind. Records of other kinds
    /// already flushed remain durable; there is no cross-kind rollback.
    #[error("Flush of {kind} batch failed: {source}")]
    Flush {
        /// Record kind whose buffer failed to flush.
        kind: RecordKind,
        #[source]
        source: rusqlite::Error,
    },

    /// A batch contained a record of a different kind than declared.
    #[error("Batch for {expected} contained a {actual} record")]
    KindMismatch {
        expected: RecordKind,
        actual: RecordKind,
    },

    /// An append was attempted after `BatchedWriter::close`.
    #[error("Writer is closed; no further appends accepted")]
    WriterClosed,
}

/// Errors in gitlake configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, GitlakeError>`.
pub type Result<T> = std::result::Result<T, GitlakeError>;

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, ProxyOptions, RemoteCallbacks, Repository};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::AcquireError;

/// One of the three transport/security models for obtaining repository
/// access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Clone over HTTPS with username/password and optional proxy.
    Https,
    /// Clone over SSH with a private key and passphrase.
    Ssh,
    /// Open an existing filesystem path directly; no clone, no network.
    Local,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Ssh => "ssh",
            Self::Local => "local",
        }
    }

    /// Resolve a locator into a strategy. Evaluated in strict order, first
    /// match wins:
    ///
    /// 1. `http…` → HTTPS clone
    /// 2. `ssh://git@…` or bare `git@…` → SSH clone
    /// 3. `/…` → local open
    /// 4. anything else is rejected
    pub fn select(url: &str) -> Result<Self, AcquireError> {
        if url.starts_with("http") {
            Ok(Self::Https)
        } else if url.strip_prefix("ssh://").unwrap_or(url).starts_with("git@") {
            Ok(Self::Ssh)
        } else if url.starts_with('/') {
            Ok(Self::Local)
        } else {
            Err(AcquireError::UnsupportedScheme(url.to_string()))
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator plus credentials for one acquisition attempt.
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    /// Repository locator: `http(s)://…`, `ssh://git@…`/`git@…`, or an
    /// absolute path.
    pub url: String,
    /// Logical repository identifier all ingested records are keyed under.
    pub repo_id: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
    pub private_key: Option<String>,
    pub passphrase: Option<String>,
}

impl AcquireOptions {
    /// Reject structurally malformed options before any transport work.
    pub fn validate(&self) -> Result<(), AcquireError> {
        if self.url.trim().is_empty() {
            return Err(AcquireError::InvalidOptions("url must not be empty".into()));
        }
        if self.repo_id.trim().is_empty() {
            return Err(AcquireError::InvalidOptions(
                "repo_id must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// An accessible repository produced by the dispatcher.
///
/// For clone strategies the handle owns the scratch directory holding the
/// clone; dropping the handle removes it.
pub struct RepoHandle {
    pub strategy: Strategy,
    pub path: PathBuf,
    pub repo: Repository,
    workdir: Option<TempDir>,
}

impl std::fmt::Debug for RepoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoHandle")
            .field("strategy", &self.strategy)
            .field("path", &self.path)
            .field("scratch", &self.workdir.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolve a locator + credentials into a repository handle.
///
/// Clone strategies block for the duration of the clone and perform network
/// I/O; wrap the call with a deadline if one is needed. Transport errors
/// propagate unmodified, tagged with the strategy that produced them.
pub fn acquire(options: &AcquireOptions) -> Result<RepoHandle, AcquireError> {
    options.validate()?;
    let strategy = Strategy::select(&options.url)?;
    debug!(url = %options.url, strategy = %strategy, "Acquisition strategy selected");

    match strategy {
        Strategy::Https => clone_over_https(options),
        Strategy::Ssh => clone_over_ssh(options),
        Strategy::Local => open_local(&options.url),
    }
}

fn open_local(path: &str) -> Result<RepoHandle, AcquireError> {
    let repo = Repository::open(path).map_err(|source| AcquireError::Git {
        strategy: Strategy::Local,
        source,
    })?;
    Ok(RepoHandle {
        strategy: Strategy::Local,
        path: PathBuf::from(path),
        repo,
        workdir: None,
    })
}

fn clone_over_https(options: &AcquireOptions) -> Result<RepoHandle, AcquireError> {
    let user = options.user.clone().unwrap_or_default();
    let password = options.password.clone().unwrap_or_default();

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username, _allowed| {
        Cred::userpass_plaintext(&user, &password)
    });

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);
    if let Some(proxy_url) = &options.proxy {
        let mut proxy = ProxyOptions::new();
        proxy.url(proxy_url);
        fetch.proxy_options(proxy);
    }

    clone_into_scratch(&options.url, Strategy::Https, fetch)
}

fn clone_over_ssh(options: &AcquireOptions) -> Result<RepoHandle, AcquireError> {
    let key = options.private_key.clone().ok_or_else(|| {
        AcquireError::InvalidOptions("ssh locator requires a private key".into())
    })?;
    let passphrase = options.passphrase.clone();

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, _allowed| {
        Cred::ssh_key_from_memory(
            username_from_url.unwrap_or("git"),
            None,
            &key,
            passphrase.as_deref(),
        )
    });

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);

    // go-git style locators carry an explicit ssh:// scheme; git2 expects
    // the bare git@host:path form.
    let url = options.url.strip_prefix("ssh://").unwrap_or(&options.url);
    clone_into_scratch(url, Strategy::Ssh, fetch)
}

fn clone_into_scratch(
    url: &str,
    strategy: Strategy,
    fetch: FetchOptions<'_>,
) -> Result<RepoHandle, AcquireError> {
    let workdir = tempfile::tempdir().map_err(AcquireError::Workspace)?;

    info!(url = %url, strategy = %strategy, path = %workdir.path().display(), "Cloning repository");
    let repo = clone_with(url, workdir.path(), fetch).map_err(|source| AcquireError::Git {
        strategy,
        source,
    })?;
    info!(url = %url, "Repository clone finished");

    Ok(RepoHandle {
        strategy,
        path: workdir.path().to_path_buf(),
        repo,
        workdir: Some(workdir),
    })
}

fn clone_with(url: &str, into: &Path, fetch: FetchOptions<'_>) -> Result<Repository, git2::Error> {
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch);
    builder.clone(url, into)
}

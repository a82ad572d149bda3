use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level gitlake configuration, matching `gitlake.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitlakeConfig {
    #[serde(default)]
    pub ingest: IngestSection,
    #[serde(default)]
    pub acquire: AcquireSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSection {
    /// Per-kind buffer capacity before a synchronous flush.
    pub batch_size: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            batch_size: crate::writer::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquireSection {
    /// Persistent directory for clones; a temp directory when unset.
    pub workspace_dir: Option<PathBuf>,
}

impl GitlakeConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

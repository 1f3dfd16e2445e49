use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker file identifying a vault root.
pub const VAULT_MARKER: &str = ".spellbook";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SpellbookConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Vault root. Discovered from the working directory when unset.
    pub vault_dir: Option<String>,
    /// Index database. Defaults to `<vault>/knowledge/index.db`.
    pub db_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    /// How far back keyword fallback scans by default; 0 scans everything.
    pub keyword_window_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            keyword_window_days: 90,
        }
    }
}

/// Returns `~/.spellbook/`
pub fn default_spellbook_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".spellbook"))
}

/// Returns the default config file path: `~/.spellbook/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(default_spellbook_dir()?.join("config.toml"))
}

impl SpellbookConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path()?)
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SpellbookConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (SPELLBOOK_VAULT, SPELLBOOK_DB, SPELLBOOK_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPELLBOOK_VAULT") {
            self.storage.vault_dir = Some(val);
        }
        if let Ok(val) = std::env::var("SPELLBOOK_DB") {
            self.storage.db_path = Some(val);
        }
        if let Ok(val) = std::env::var("SPELLBOOK_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the vault root: the configured directory, else the nearest
    /// ancestor of the working directory that holds a `.spellbook` marker.
    pub fn resolved_vault_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.vault_dir {
            return expand_tilde(dir);
        }
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        find_vault_root(&cwd).with_context(|| {
            format!(
                "no {VAULT_MARKER} marker found above {}; set SPELLBOOK_VAULT or storage.vault_dir",
                cwd.display()
            )
        })
    }

    /// The archive root holding `log/` and `buffer/`.
    pub fn resolved_knowledge_dir(&self) -> Result<PathBuf> {
        Ok(self.resolved_vault_dir()?.join("knowledge"))
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => expand_tilde(path),
            None => Ok(self.resolved_knowledge_dir()?.join("index.db")),
        }
    }

    /// Default keyword fallback window, ending after `now`'s day. `None` when
    /// `keyword_window_days` is 0.
    pub fn keyword_window(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.retrieval.keyword_window_days {
            0 => None,
            days => Some((now - Duration::days(i64::from(days)), now + Duration::days(1))),
        }
    }
}

/// Walk up from `start` to the first directory containing the vault marker.
///
/// Only a marker file counts: `~/.spellbook/` is the config directory and
/// must not turn the home directory into a vault.
pub fn find_vault_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(VAULT_MARKER).is_file())
        .map(Path::to_path_buf)
}

pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("home directory must exist")
}

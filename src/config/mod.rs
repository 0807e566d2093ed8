//! Configuration management.
//!
//! Settings come from a TOML file, then environment variables override
//! individual values:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VAULTSCRIBE_VAULT_PATH` | `vault_path` |
//! | `VAULTSCRIBE_TEMPLATES_DIR` | `templates_dir` |
//! | `VAULTSCRIBE_LOG_LEVEL` | `logging.level` |
//! | `VAULTSCRIBE_LOG_FORMAT` | `logging.format` |
//!
//! A `.env` file in the working directory is loaded first when present.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::VaultFolder;
use crate::observability::{LogFormat, LoggingConfig};
use crate::rendering::DEFAULT_MAX_INCLUDE_DEPTH;
use crate::services::DEFAULT_CACHE_CAPACITY;
use crate::{Error, Result};

/// Application name used for config directories.
const APP_NAME: &str = "vaultscribe";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration for vaultscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultscribeConfig {
    /// Root of the note vault.
    pub vault_path: PathBuf,
    /// Template directory; `<vault>/99_Meta/Templates` when unset.
    pub templates_dir: Option<PathBuf>,
    /// Templates kept per cache.
    pub cache_capacity: usize,
    /// Limit on nested includes.
    pub max_include_depth: usize,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Vault root.
    pub vault_path: Option<String>,
    /// Template directory.
    pub templates_dir: Option<String>,
    /// Cache capacity.
    pub cache_capacity: Option<usize>,
    /// Include depth limit.
    pub max_include_depth: Option<usize>,
    /// Logging section.
    pub logging: Option<LoggingConfig>,
}

impl Default for VaultscribeConfig {
    fn default() -> Self {
        Self {
            vault_path: PathBuf::from("."),
            templates_dir: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            logging: LoggingConfig::default(),
        }
    }
}

impl VaultscribeConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the effective template directory.
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| self.vault_path.join(VaultFolder::Templates.as_str()))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::operation("read_config_file", e))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config directory
    /// (`~/.config/vaultscribe/config.toml` on Linux) and returns defaults
    /// when no readable file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(dirs) = directories::ProjectDirs::from("", "", APP_NAME) else {
            return Self::default();
        };

        let path = dirs.config_dir().join(CONFIG_FILE_NAME);
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Loads configuration for a process: `.env`, then the file (explicit
    /// path or default location), then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded or an
    /// environment override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // a missing .env is fine
        let _ = dotenvy::dotenv();

        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `VAULTSCRIBE_*` overrides read through `var`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown log format.
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = var("VAULTSCRIBE_VAULT_PATH").filter(|v| !v.is_empty()) {
            self.vault_path = PathBuf::from(path);
        }
        if let Some(dir) = var("VAULTSCRIBE_TEMPLATES_DIR").filter(|v| !v.is_empty()) {
            self.templates_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = var("VAULTSCRIBE_LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
        if let Some(format) = var("VAULTSCRIBE_LOG_FORMAT").filter(|v| !v.is_empty()) {
            self.logging.format = LogFormat::parse(&format).ok_or_else(|| {
                Error::InvalidInput(format!("unknown log format '{format}'"))
            })?;
        }
        Ok(self)
    }

    /// Converts a `ConfigFile` to `VaultscribeConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(vault_path) = file.vault_path {
            config.vault_path = PathBuf::from(vault_path);
        }
        if let Some(templates_dir) = file.templates_dir {
            config.templates_dir = Some(PathBuf::from(templates_dir));
        }
        if let Some(capacity) = file.cache_capacity {
            config.cache_capacity = capacity;
        }
        if let Some(depth) = file.max_include_depth {
            config.max_include_depth = depth;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }

    /// Sets the vault path.
    #[must_use]
    pub fn with_vault_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vault_path = path.into();
        self
    }

    /// Sets the template directory.
    #[must_use]
    pub fn with_templates_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(path.into());
        self
    }
}

//! Settings.
//!
//! Paths and key material are layered: built-in defaults under
//! `~/.kryptos`, then the optional `config.toml` in that directory, then
//! environment variables. Command-line flags are applied by the caller.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Contents of `config.toml`.
///
/// Relative paths are resolved against the kryptos home directory.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Database file path
    pub database: Option<PathBuf>,
    /// Key file path
    pub key_file: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the TOML is malformed.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents).map_err(ConfigError::Parse)?)
    }

    /// Load `path` if it exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents).map(Some)
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Kryptos home directory
    pub home: PathBuf,
    /// Database file
    pub database: PathBuf,
    /// Key file
    pub key_file: PathBuf,
    /// Key material from the environment; wins over the key file
    pub encryption_key: Option<Zeroizing<String>>,
}

impl Settings {
    /// Defaults rooted at `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            database: home.join(constants::DATABASE_FILE),
            key_file: home.join(constants::KEY_FILE),
            encryption_key: None,
            home,
        }
    }

    /// Load settings from the process environment and the config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoHome` if no home directory can be found, or
    /// a read/parse error for a broken config file.
    pub fn load() -> Result<Self> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load settings, reading variables through `var`.
    pub fn load_with(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let home = match var(constants::ENV_HOME) {
            Some(home) => PathBuf::from(home),
            None => dirs::home_dir()
                .ok_or(ConfigError::NoHome)?
                .join(constants::HOME_DIR),
        };

        let mut settings = Self::with_home(&home);

        if let Some(file) = FileConfig::load(&home.join(constants::CONFIG_FILE))? {
            settings.apply(file);
        }

        if let Some(path) = var(constants::ENV_DATABASE) {
            settings.database = PathBuf::from(path);
        }
        if let Some(path) = var(constants::ENV_KEY_FILE) {
            settings.key_file = PathBuf::from(path);
        }
        settings.encryption_key = var(constants::ENV_ENCRYPTION_KEY).map(Zeroizing::new);

        debug!(
            home = %settings.home.display(),
            database = %settings.database.display(),
            key_file = %settings.key_file.display(),
            env_key = settings.encryption_key.is_some(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Apply values from a config file.
    pub fn apply(&mut self, file: FileConfig) {
        if let Some(path) = file.database {
            self.database = self.home.join(path);
        }
        if let Some(path) = file.key_file {
            self.key_file = self.home.join(path);
        }
    }

    /// Path of the config file.
    pub fn config_path(&self) -> PathBuf {
        self.home.join(constants::CONFIG_FILE)
    }
}

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DATABASE_ENV: &str = "POCKET_DATABASE";
pub const LOG_ENV: &str = "POCKET_LOG";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub advisor: AdvisorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database: String,
    pub max_connections: u32,
    /// How long a write waits for a competing writer before failing
    pub busy_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: "pocket.db".to_string(),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl StorageConfig {
    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub base_url: String,
    pub model: String,
    /// Usually supplied through GEMINI_API_KEY instead of the file
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_secs: 20,
        }
    }
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let s = fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path`, refusing to overwrite.
    pub fn save_new(&self, path: &Path) -> Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        let s = toml::to_string_pretty(self).context("serialize config")?;
        fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(database) = var(DATABASE_ENV) {
            self.storage.database = database;
        }
        if let Some(level) = var(LOG_ENV) {
            self.logging.level = level;
        }
        if let Some(key) = var(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.advisor.api_key = Some(key);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.storage.database.trim().is_empty() {
            bail!("storage.database must not be empty");
        }
        if self.storage.max_connections == 0 {
            bail!("storage.max_connections must be greater than 0");
        }
        if self.advisor.timeout_secs == 0 {
            bail!("advisor.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

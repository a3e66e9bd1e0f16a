use serde::{Deserialize, Serialize};

use super::database::DatabaseConfig;
use super::errors::ConfigError;
use super::lock::LockConfig;
use super::logging::{LogFormat, LoggingConfig};
use super::server::ServerConfig;
use super::sweep::{SweepConfig, MAX_BATCH_SIZE};

/// Main configuration structure for Spacesweep
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// HTTP trigger (bind address, port, shared secret)
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// TTLs, batching, concurrency and deadline of a sweep run
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Overlap lock between concurrent runs
    #[serde(default)]
    pub lock: LockConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. spacesweep.toml in current directory
    /// 3. /etc/spacesweep/config.toml
    /// 4. Default configuration
    ///
    /// Command-line (and environment) overrides are applied on top.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = Self::get_config_path() {
            Self::from_file(&found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(key) = overrides.api_key {
            self.server.api_key = Some(key);
        }
        if let Some(db) = overrides.database_path {
            self.database.path = db;
        }
        if let Some(id) = overrides.database_id {
            self.database.database_id = id;
        }
        if let Some(minutes) = overrides.presence_ttl_minutes {
            self.sweep.presence_ttl_minutes = minutes;
        }
        if let Some(hours) = overrides.message_ttl_hours {
            self.sweep.message_ttl_hours = hours;
        }
        if let Some(batch) = overrides.batch_size {
            self.sweep.batch_size = batch;
        }
        if let Some(concurrency) = overrides.max_concurrency {
            self.sweep.max_concurrency = concurrency;
        }
        if let Some(deadline) = overrides.deadline_secs {
            self.sweep.deadline_secs = deadline;
        }
        if let Some(margin) = overrides.drain_margin_secs {
            self.sweep.drain_margin_secs = margin;
        }
        if let Some(ttl) = overrides.lock_ttl_secs {
            self.lock.ttl_secs = ttl;
        }
        if let Some(lock_id) = overrides.lock_id {
            self.lock.lock_id = lock_id;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("HTTP port cannot be 0".to_string()));
        }

        let sweep = &self.sweep;
        if sweep.presence_ttl_minutes == 0 || sweep.message_ttl_hours == 0 {
            return Err(ConfigError::Validation(
                "TTLs must be greater than zero".to_string(),
            ));
        }

        if sweep.batch_size == 0 || sweep.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Validation(format!(
                "batch_size must be between 1 and {} (got {})",
                MAX_BATCH_SIZE, sweep.batch_size
            )));
        }

        if sweep.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        if sweep.deadline_secs <= sweep.drain_margin_secs {
            return Err(ConfigError::Validation(format!(
                "deadline_secs ({}) must exceed drain_margin_secs ({})",
                sweep.deadline_secs, sweep.drain_margin_secs
            )));
        }

        if sweep.schedule_enabled && sweep.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.database.page_size == 0 {
            return Err(ConfigError::Validation(
                "page_size must be at least 1".to_string(),
            ));
        }

        if self.lock.enabled && self.lock.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "lock ttl_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("spacesweep.toml").exists() {
            Some("spacesweep.toml".to_string())
        } else if std::path::Path::new("/etc/spacesweep/config.toml").exists() {
            Some("/etc/spacesweep/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub database_path: Option<String>,
    pub database_id: Option<String>,
    pub presence_ttl_minutes: Option<u32>,
    pub message_ttl_hours: Option<u32>,
    pub batch_size: Option<usize>,
    pub max_concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub drain_margin_secs: Option<u64>,
    pub lock_ttl_secs: Option<u64>,
    pub lock_id: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

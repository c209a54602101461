use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::{Config, VectorBackend};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),

    #[error("Invalid score_threshold: {0}. Must be between 0 and 1")]
    InvalidScoreThreshold(f32),

    #[error("Invalid {0}: must be at least 1")]
    ZeroValue(&'static str),

    #[error("Invalid rate limit: requests_per_second must be at least 1")]
    InvalidRateLimit,

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Pinecone backend requires vector_index.pinecone.host")]
    MissingPineconeHost,

    #[error("SQLite backend requires a non-empty vector_index.sqlite_path")]
    EmptySqlitePath,
}

/// Directory holding project configuration files
pub const CONFIG_DIR: &str = ".pdfchat";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "PDFCHAT_";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .pdfchat/config.yaml (project config)
    /// 3. .pdfchat/local.yaml (local overrides, optional)
    /// 4. Environment variables (PDFCHAT_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`], resolving the config directory under `root`
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let config_dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        config
            .chunking
            .validate()
            .map_err(ConfigError::InvalidChunking)?;

        let threshold = config.retrieval.score_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidScoreThreshold(threshold));
        }

        if config.retrieval.top_k == 0 {
            return Err(ConfigError::ZeroValue("retrieval.top_k"));
        }

        if config.retrieval.max_context_chars == 0 {
            return Err(ConfigError::ZeroValue("retrieval.max_context_chars"));
        }

        if config.ingestion.max_concurrency == 0 {
            return Err(ConfigError::ZeroValue("ingestion.max_concurrency"));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::ZeroValue("embedding.dimension"));
        }

        if config.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        match config.vector_index.backend {
            VectorBackend::Pinecone => {
                let has_host = config
                    .vector_index
                    .pinecone
                    .host
                    .as_deref()
                    .is_some_and(|host| !host.is_empty());
                if !has_host {
                    return Err(ConfigError::MissingPineconeHost);
                }
                if config.vector_index.pinecone.upsert_batch_size == 0 {
                    return Err(ConfigError::ZeroValue("vector_index.pinecone.upsert_batch_size"));
                }
            }
            VectorBackend::Sqlite => {
                if config.vector_index.sqlite_path.is_empty() {
                    return Err(ConfigError::EmptySqlitePath);
                }
            }
            VectorBackend::Memory => {}
        }

        Ok(())
    }
}

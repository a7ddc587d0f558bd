use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::query::strategy::{SpatialMatch, TermMatch};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LesionConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Restrict term matching to one annotation vocabulary. `None` scans all.
    pub vocabulary: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    /// Term matching strategy: `"exact"`, `"exact_ci"`, or `"substring"`.
    pub term_match: String,
    /// Spatial matching strategy: `"exact"` or `"radius"`.
    pub spatial_match: String,
    /// Neighborhood radius in mm for radius matching.
    pub radius: f64,
    /// Coordinate comparison tolerance for exact matching.
    pub epsilon: f64,
    /// Result cap applied when the caller does not supply one.
    pub default_limit: usize,
    /// Per-request deadline in milliseconds. 0 disables the deadline.
    pub timeout_ms: u64,
}

impl Default for LesionConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7171,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_lesion_dir()
            .join("corpus.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            vocabulary: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            term_match: "exact_ci".into(),
            spatial_match: "radius".into(),
            radius: 2.0,
            epsilon: 1e-6,
            default_limit: 20,
            timeout_ms: 10_000,
        }
    }
}

/// Returns `~/.lesion/`
pub fn default_lesion_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".lesion")
}

/// Returns the default config file path: `~/.lesion/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lesion_dir().join("config.toml")
}

impl LesionConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LesionConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LESION_DB, LESION_VOCABULARY, LESION_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LESION_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LESION_VOCABULARY") {
            self.storage.vocabulary = if val.is_empty() { None } else { Some(val) };
        }
        if let Ok(val) = std::env::var("LESION_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// The configured term matching strategy. Unrecognized config values fall
    /// back to case-insensitive exact matching.
    pub fn term_match(&self) -> TermMatch {
        self.query
            .term_match
            .parse()
            .unwrap_or(TermMatch::ExactCaseInsensitive)
    }

    /// The configured spatial matching strategy, carrying the configured
    /// radius or epsilon.
    pub fn spatial_match(&self) -> SpatialMatch {
        match self.query.spatial_match.as_str() {
            "exact" => SpatialMatch::Exact {
                epsilon: self.query.epsilon,
            },
            _ => SpatialMatch::Radius {
                radius: self.query.radius,
            },
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

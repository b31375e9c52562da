//! Configuration shared by the `adr` and `adr-app` binaries.
//!
//! The config file is TOML. Its location is the explicit `--config` path,
//! else `$ADR_CONFIG`, else `<config dir>/adr/config.toml`. A missing default
//! file means built-in defaults; a missing explicit file is an error.
//! `ADR_URL`, `ADR_FORMAT`, `ADR_RECIPE_PATHS` and `ADR_CACHE_TTL` override
//! file values.
//!
//! ```toml
//! url = "https://activedata.allizom.org/query"
//! format = "table"
//! recipe_paths = ["/home/me/adr-recipes"]
//!
//! [client]
//! timeout_secs = 60
//! max_retries = 2
//!
//! [cache]
//! enabled = true
//! ttl_secs = 3600
//!
//! [app]
//! host = "127.0.0.1"
//! port = 5000
//! ```

use crate::error::{Error, Result};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project name used for the config directory and environment prefix.
pub const PROJECT_NAME: &str = "adr";

/// Default ActiveData query endpoint.
pub const DEFAULT_URL: &str = "https://activedata.allizom.org/query";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ADR_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdrConfig {
    /// Query endpoint.
    pub url: String,

    /// Default output format for the CLI.
    pub format: OutputFormat,

    /// Extra directories of recipe descriptors, loaded after the built-ins.
    pub recipe_paths: Vec<PathBuf>,

    /// Query client settings.
    pub client: ClientConfig,

    /// Query result cache settings.
    pub cache: CacheConfig,

    /// Web app settings.
    pub app: AppConfig,
}

impl Default for AdrConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            format: OutputFormat::default(),
            recipe_paths: Vec::new(),
            client: ClientConfig::default(),
            cache: CacheConfig::default(),
            app: AppConfig::default(),
        }
    }
}

/// Query client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for transient failures; `0` surfaces the first failure.
    pub max_retries: u32,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 0,
            user_agent: format!("{PROJECT_NAME}/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Query result cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Reuse results of identical queries.
    pub enabled: bool,

    /// How long a result stays fresh, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: 3600,
        }
    }
}

/// Web app listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl AdrConfig {
    /// Default config file location, if the platform has a config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// Config file location: `explicit`, else `$ADR_CONFIG`, else the default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        explicit
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var(CONFIG_ENV)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .or_else(Self::default_config_path)
    }

    /// Loads configuration and applies environment overrides.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let explicit_requested = explicit.is_some()
            || std::env::var(CONFIG_ENV).is_ok_and(|v| !v.is_empty());

        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit_requested => {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parses TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Applies `ADR_URL`, `ADR_FORMAT`, `ADR_RECIPE_PATHS` and
    /// `ADR_CACHE_TTL` from `lookup`.
    ///
    /// Empty values are ignored. Unparseable values are logged and ignored.
    /// Setting `ADR_CACHE_TTL` also enables the cache.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get("ADR_URL") {
            self.url = url;
        }
        if let Some(format) = get("ADR_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(e) => tracing::warn!(error = %e, "Ignoring ADR_FORMAT"),
            }
        }
        if let Some(paths) = get("ADR_RECIPE_PATHS") {
            self.recipe_paths = std::env::split_paths(&paths).collect();
        }
        if let Some(ttl) = get("ADR_CACHE_TTL") {
            match ttl.parse() {
                Ok(ttl_secs) => {
                    self.cache.enabled = true;
                    self.cache.ttl_secs = ttl_secs;
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring ADR_CACHE_TTL"),
            }
        }
    }

    /// Checks values the clients depend on.
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::config(format!(
                "url must be an http(s) URL, got '{}'",
                self.url
            )));
        }
        if self.client.timeout_secs == 0 {
            return Err(Error::config("client.timeout_secs must be greater than 0"));
        }
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(Error::config("cache.ttl_secs must be greater than 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

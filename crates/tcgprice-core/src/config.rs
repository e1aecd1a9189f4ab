//! Configuration management for tcgprice.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/tcgprice/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cache freshness settings
    pub cache: CacheConfig,
    /// Retry, timeout and pacing settings for scraping
    pub scraping: ScrapingConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Price store settings
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        let config: Self = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `TCGPRICE_CACHE_EXPIRY_HOURS`: Override the cache freshness window
    /// - `TCGPRICE_HEADLESS`: Override browser headless mode (true/false)
    /// - `TCGPRICE_DATABASE_PATH`: Override the price store location
    /// - `TCGPRICE_MAX_ATTEMPTS`: Override the fetch attempt count
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `TCGPRICE_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TCGPRICE_CACHE_EXPIRY_HOURS") {
            if let Ok(hours) = val.parse() {
                self.cache.expiry_hours = hours;
                tracing::debug!("Override cache.expiry_hours from env: {}", hours);
            }
        }

        if let Ok(val) = std::env::var("TCGPRICE_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("TCGPRICE_DATABASE_PATH") {
            if !val.trim().is_empty() {
                tracing::debug!("Override database.path from env: {}", val);
                self.database.path = Some(val);
            }
        }

        if let Ok(val) = std::env::var("TCGPRICE_MAX_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.scraping.max_attempts = attempts;
                tracing::debug!("Override scraping.max_attempts from env: {}", attempts);
            }
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let zero_checks = [
            ("cache.expiry_hours", u64::from(self.cache.expiry_hours)),
            ("scraping.max_attempts", u64::from(self.scraping.max_attempts)),
            ("scraping.fetch_timeout_secs", self.scraping.fetch_timeout_secs),
            (
                "browser.max_sessions",
                u64::try_from(self.browser.max_sessions).unwrap_or(u64::MAX),
            ),
            (
                "browser.navigation_timeout_secs",
                self.browser.navigation_timeout_secs,
            ),
            ("database.max_connections", u64::from(self.database.max_connections)),
        ];

        for (field, value) in zero_checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.cache.expiry_hours > MAX_EXPIRY_HOURS {
            return Err(ConfigError::InvalidValue {
                field: "cache.expiry_hours".to_string(),
                reason: format!("must be at most {MAX_EXPIRY_HOURS}"),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/tcgprice/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "tcgprice", "tcgprice").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/tcgprice`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "tcgprice", "tcgprice").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Longest accepted cache window, one hundred years.
pub const MAX_EXPIRY_HOURS: u32 = 876_000;

/// Cache freshness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Records older than this many hours are stale
    pub expiry_hours: u32,
    /// Treat cached failure records as stale
    pub require_prices_on_hit: bool,
}

impl CacheConfig {
    /// Shorter window used for marketplace-direct price checks.
    #[must_use]
    pub fn marketplace_direct() -> Self {
        Self {
            expiry_hours: 24,
            ..Self::default()
        }
    }

    /// Freshness window as a chrono duration.
    #[must_use]
    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.expiry_hours))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_hours: 168, // 7 days
            require_prices_on_hit: false,
        }
    }
}

/// Retry, timeout and pacing settings for scraping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Attempts per fetch step, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Upper bound for a single fetch in seconds
    pub fetch_timeout_secs: u64,
    /// Fixed delay between requests to the same domain in milliseconds
    pub request_delay_ms: u64,
    /// Share one upstream resolution between concurrent identical requests
    pub coalesce_requests: bool,
    /// Retry the search by card name when the number yields nothing
    pub search_by_name_fallback: bool,
}

impl ScrapingConfig {
    /// Delay between attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Timeout for a single fetch.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Delay between requests to one domain.
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
            fetch_timeout_secs: 30,
            request_delay_ms: 1000,
            coalesce_requests: true,
            search_by_name_fallback: true,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Maximum number of pages open at once
    pub max_sessions: usize,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Marketplace root URL
    pub marketplace_base_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            max_sessions: 2,
            navigation_timeout_secs: 30,
            marketplace_base_url: "https://www.tcgplayer.com".to_string(),
        }
    }
}

/// Price store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, `:memory:` for a transient store
    pub path: Option<String>,
    /// Connection pool size
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Configured path, or `prices.db` under the data directory.
    pub fn resolved_path(&self) -> ConfigResult<String> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(AppConfig::data_dir()?
                .join("prices.db")
                .to_string_lossy()
                .into_owned()),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
        }
    }
}

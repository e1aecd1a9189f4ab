//! Core error types for tcgprice.
//!
//! This module defines the central error type used across all subsystems,
//! plus the error contract of the [`Fetcher`](crate::Fetcher) collaborator.

use thiserror::Error;

/// Central error type for tcgprice operations.
#[derive(Error, Debug)]
pub enum PriceError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// Marketplace fetch errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Persistent store errors
    #[error("store error: {0}")]
    Store(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Errors reported by a [`Fetcher`](crate::Fetcher) implementation.
///
/// Every variant is considered transient by the resolver and is retried
/// before the resolution is classified as a scrape failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Page navigation failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// Target URL
        url: String,
        /// Failure reason
        reason: String,
    },

    /// The fetch did not complete in time
    #[error("fetch timed out: {0}")]
    Timeout(String),

    /// The page loaded but its content could not be interpreted
    #[error("failed to parse page: {0}")]
    Parse(String),

    /// The marketplace refused the request
    #[error("rate limited by {0}")]
    RateLimited(String),

    /// Browser automation failure
    #[error("browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Whether this error represents an elapsed timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type alias using `PriceError`.
pub type Result<T> = std::result::Result<T, PriceError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PriceError::Validation("card_number is empty".to_string());
        assert_eq!(err.to_string(), "validation error: card_number is empty");

        let err = FetchError::Navigation {
            url: "https://example.com".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "navigation to https://example.com failed: connection reset"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: PriceError = config_err.into();
        assert!(matches!(err, PriceError::Config(_)));
    }

    #[test]
    fn test_error_from_fetch() {
        let err: PriceError = FetchError::Timeout("30s".to_string()).into();
        assert!(matches!(err, PriceError::Fetch(FetchError::Timeout(_))));
    }

    #[test]
    fn test_fetch_error_is_timeout() {
        assert!(FetchError::Timeout("30s".to_string()).is_timeout());
        assert!(!FetchError::Parse("no table".to_string()).is_timeout());
    }
}

//! tcgprice Core - Foundation crate for the tcgprice resolution engine.
//!
//! This crate provides the shared domain types, the error hierarchy, the
//! [`Fetcher`] contract implemented by marketplace scrapers, and configuration
//! management that all other tcgprice crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Queries, price records and search candidates
//! - [`fetcher`] - Async trait for retrieving marketplace data
//!
//! # Example
//!
//! ```rust
//! use tcgprice_core::{AppConfig, PriceQuery};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.cache.expiry_hours, 168);
//!
//! let query = PriceQuery::new("BLTR-EN051").with_rarity("Secret Rare");
//! query.validate()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod fetcher;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, CacheConfig, DatabaseConfig, ScrapingConfig};
pub use error::{ConfigError, ConfigResult, FetchError, PriceError, Result};
pub use fetcher::Fetcher;
pub use types::{
    CandidateVariant, PriceFields, PriceQuery, PriceRecord, SearchOutcome, SearchQuery,
};

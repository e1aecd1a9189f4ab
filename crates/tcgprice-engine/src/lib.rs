//! tcgprice Resolution Engine
//!
//! Turns a loosely specified card identity into a priced record. The
//! [`PriceResolver`] checks the [`PriceCache`] first and, on a miss or a
//! stale hit, searches the marketplace through an injected
//! [`Fetcher`](tcgprice_core::Fetcher), picks the best candidate, fetches its
//! prices and caches the outcome. Failed scrapes are cached too.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tcgprice_core::{AppConfig, PriceQuery};
//! use tcgprice_db::MemoryPriceStore;
//! use tcgprice_engine::{PriceCache, PriceResolver, ResolverSettings};
//!
//! let config = AppConfig::default();
//! let cache = PriceCache::new(Arc::new(MemoryPriceStore::new()), &config.cache);
//! let resolver = PriceResolver::new(cache, fetcher, ResolverSettings::from(&config));
//!
//! let resolution = resolver
//!     .resolve(&PriceQuery::new("BLTR-EN051").with_rarity("Secret Rare"))
//!     .await?;
//! println!("{:?}", resolution.record.prices);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod singleflight;

pub use cache::{CacheError, CacheLookup, CacheStats, PriceCache};
pub use error::{ResolveError, Result};
pub use orchestrator::{PriceResolution, PriceResolver, ResolverSettings};
pub use retry::{retry_fetch, RetryError, RetryPolicy};
pub use singleflight::SingleFlight;
pub use tokio_util::sync::CancellationToken;

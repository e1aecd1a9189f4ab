//! Browser automation for marketplace price scraping.
//!
//! Drives a headless Chromium through a bounded pool of pages, spaces out
//! requests per domain, and parses search and product pages into the
//! candidates and price fields the resolver works with.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod parse;
pub mod rate_limit;

pub use engine::{BrowserEngine, FetchedPage, PageSource};
pub use error::{BrowserError, Result};
pub use fetcher::MarketplaceFetcher;
pub use parse::{parse_price, MarketplaceSelectors};

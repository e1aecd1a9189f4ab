//! Contract for retrieving marketplace data.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{CandidateVariant, PriceFields, SearchOutcome, SearchQuery};

/// Retrieves search results and price fields from one marketplace.
///
/// Implementations own their own pooling and pacing. Both calls may be slow
/// (a full browser session may sit behind them) and the resolver wraps each
/// one in its own timeout and retry loop.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Run a marketplace search.
    async fn search_candidates(&self, query: &SearchQuery) -> Result<SearchOutcome, FetchError>;

    /// Extract price fields from a candidate's product page.
    async fn fetch_price_fields(
        &self,
        candidate: &CandidateVariant,
    ) -> Result<PriceFields, FetchError>;
}

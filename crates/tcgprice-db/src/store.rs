//! Store driver contract used by the price cache.

use async_trait::async_trait;

use crate::document::PriceDocument;
use crate::error::Result;
use crate::filter::{CountFilter, PriceFilter};

/// What a [`PriceStore::replace_one`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// An existing document was replaced
    Replaced,
    /// No document matched, a new one was inserted
    Inserted,
}

/// Collection-level primitives over persisted price documents.
///
/// Implementations must be safe to share between tasks. Concurrent
/// `replace_one` calls for the same key resolve as last-writer-wins.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Most recently updated document matching `filter`, if any.
    async fn find_one(&self, filter: &PriceFilter) -> Result<Option<PriceDocument>>;

    /// Replace the most recent document matching `filter`, or insert `doc`
    /// when nothing matches.
    ///
    /// Identity fields (`card_name`, `card_art_variant`, `card_rarity`,
    /// `set_code`, `booster_set_name`) that are `None` on `doc` keep their
    /// stored values; every other field is overwritten.
    async fn replace_one(&self, filter: &PriceFilter, doc: &PriceDocument)
        -> Result<ReplaceOutcome>;

    /// Number of documents matching `filter`.
    async fn count(&self, filter: &CountFilter) -> Result<u64>;
}

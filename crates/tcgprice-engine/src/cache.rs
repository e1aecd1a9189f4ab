//! Tiered, freshness-bounded price cache over a [`PriceStore`].
//!
//! A lookup tries progressively looser filters and stops at the first tier
//! with any match:
//!
//! 1. card number + rarity (substring) + art variant (exact)
//! 2. card number + rarity (substring)
//! 3. card number alone
//!
//! Tier order decides which record is used. Freshness only decides whether
//! that record may be served without re-scraping.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tcgprice_core::{CacheConfig, PriceRecord};
use tcgprice_db::{
    CountFilter, DatabaseError, FieldMatch, PriceDocument, PriceFilter, PriceStore, ReplaceOutcome,
};
use thiserror::Error;

/// Cache-level failures.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The record lacks an identity field the cache requires
    #[error("refusing to cache a record without {0}")]
    MissingIdentity(&'static str),

    /// The underlying store failed
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    /// Matched record, if any tier matched
    pub record: Option<PriceRecord>,
    /// Whether the record may be served as-is
    pub is_fresh: bool,
    /// Age of the matched record, if its timestamp parsed
    pub age: Option<Duration>,
}

impl CacheLookup {
    fn miss() -> Self {
        Self {
            record: None,
            is_fresh: false,
            age: None,
        }
    }

    /// Record age in fractional hours.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn age_hours(&self) -> Option<f64> {
        self.age
            .map(|age| age.num_milliseconds() as f64 / 3_600_000.0)
    }
}

/// Aggregate counts over the cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// All records
    pub total: u64,
    /// Records inside the freshness window
    pub fresh: u64,
    /// Records outside the freshness window
    pub stale: u64,
    /// Records with prices
    pub successful: u64,
    /// Cached scrape failures
    pub failed: u64,
    /// Configured freshness window in hours
    pub expiry_hours: i64,
}

/// Price cache with a configurable freshness window.
#[derive(Clone)]
pub struct PriceCache {
    store: Arc<dyn PriceStore>,
    expiry: Duration,
    require_prices_on_hit: bool,
}

impl PriceCache {
    /// Create a cache over `store` using the configured window.
    #[must_use]
    pub fn new(store: Arc<dyn PriceStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            expiry: config.expiry(),
            require_prices_on_hit: config.require_prices_on_hit,
        }
    }

    /// Create a cache with an explicit freshness window.
    #[must_use]
    pub fn with_expiry(store: Arc<dyn PriceStore>, expiry: Duration) -> Self {
        Self {
            store,
            expiry,
            require_prices_on_hit: false,
        }
    }

    /// Treat cached failure records as stale.
    #[must_use]
    pub fn require_prices_on_hit(mut self, require: bool) -> Self {
        self.require_prices_on_hit = require;
        self
    }

    /// Configured freshness window.
    #[must_use]
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// A timestamp is fresh while strictly inside the window.
    #[must_use]
    pub fn is_fresh_at(&self, updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - updated < self.expiry
    }

    /// Look up the best cached record for an identity.
    pub async fn lookup(
        &self,
        card_number: &str,
        card_rarity: Option<&str>,
        art_variant: Option<&str>,
    ) -> Result<CacheLookup, CacheError> {
        self.lookup_at(card_number, card_rarity, art_variant, Utc::now())
            .await
    }

    /// [`lookup`](Self::lookup) against an explicit clock.
    pub async fn lookup_at(
        &self,
        card_number: &str,
        card_rarity: Option<&str>,
        art_variant: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<CacheLookup, CacheError> {
        let card_number = card_number.trim();
        if card_number.is_empty() {
            return Ok(CacheLookup::miss());
        }

        for (tier, filter) in lookup_tiers(card_number, card_rarity, art_variant)
            .into_iter()
            .enumerate()
        {
            if let Some(doc) = self.store.find_one(&filter).await? {
                tracing::debug!("Cache tier {} matched {}", tier + 1, card_number);
                return Ok(self.evaluate(doc, now));
            }
        }

        tracing::debug!("No cached record for {}", card_number);
        Ok(CacheLookup::miss())
    }

    fn evaluate(&self, doc: PriceDocument, now: DateTime<Utc>) -> CacheLookup {
        let updated = doc.timestamp();
        let record = doc.into_record();

        let mut is_fresh = updated.is_some_and(|ts| self.is_fresh_at(ts, now));
        if is_fresh && self.require_prices_on_hit && !record.scrape_success {
            tracing::debug!("Cached record for {} has no prices", record.card_number);
            is_fresh = false;
        }

        CacheLookup {
            record: Some(record),
            is_fresh,
            age: updated.map(|ts| now - ts),
        }
    }

    /// Persist a record, replacing the stored record with the same identity.
    ///
    /// Blank name fields are left out of both the match key and the stored
    /// document, so they never erase a stored value. A record without an art
    /// variant only replaces another record without one.
    pub async fn upsert(&self, record: &PriceRecord) -> Result<ReplaceOutcome, CacheError> {
        if record.card_number.trim().is_empty() {
            return Err(CacheError::MissingIdentity("card_number"));
        }
        if record.card_rarity.trim().is_empty() {
            return Err(CacheError::MissingIdentity("card_rarity"));
        }

        let doc = PriceDocument::from_record(record);
        let filter = PriceFilter::identity_of(&doc);
        let outcome = self.store.replace_one(&filter, &doc).await?;

        tracing::info!(
            "Cached {} ({}) for {}",
            if doc.scrape_success { "prices" } else { "failure" },
            match outcome {
                ReplaceOutcome::Replaced => "replaced",
                ReplaceOutcome::Inserted => "inserted",
            },
            doc.card_number
        );
        Ok(outcome)
    }

    /// Collection statistics.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        self.stats_at(Utc::now()).await
    }

    /// [`stats`](Self::stats) against an explicit clock.
    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<CacheStats, CacheError> {
        let total = self.store.count(&CountFilter::default()).await?;
        // A window reaching past the earliest representable instant covers everything.
        let fresh = match now.checked_sub_signed(self.expiry) {
            Some(cutoff) => {
                self.store
                    .count(&CountFilter {
                        updated_after: Some(cutoff),
                        scrape_success: None,
                    })
                    .await?
            }
            None => total,
        };
        let successful = self
            .store
            .count(&CountFilter {
                updated_after: None,
                scrape_success: Some(true),
            })
            .await?;

        Ok(CacheStats {
            total,
            fresh,
            stale: total.saturating_sub(fresh),
            successful,
            failed: total.saturating_sub(successful),
            expiry_hours: self.expiry.num_hours(),
        })
    }
}

fn lookup_tiers(
    card_number: &str,
    card_rarity: Option<&str>,
    art_variant: Option<&str>,
) -> Vec<PriceFilter> {
    let rarity = card_rarity.map(str::trim).filter(|r| !r.is_empty());
    let art = art_variant.map(str::trim).filter(|a| !a.is_empty());

    let mut tiers = Vec::with_capacity(3);
    if let Some(rarity) = rarity {
        let by_rarity =
            PriceFilter::new(card_number).with_rarity(FieldMatch::Contains(rarity.to_string()));
        if let Some(art) = art {
            tiers.push(
                by_rarity
                    .clone()
                    .with_art_variant(FieldMatch::Exact(art.to_string())),
            );
        }
        tiers.push(by_rarity);
    }
    tiers.push(PriceFilter::new(card_number));
    tiers
}

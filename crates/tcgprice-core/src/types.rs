//! Shared domain types for price resolution.
//!
//! A [`PriceQuery`] describes the card a caller wants priced, a
//! [`PriceRecord`] is the priced (or failed) result that gets cached, and
//! [`CandidateVariant`] / [`SearchOutcome`] carry transient search results
//! between the fetcher and the scorer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PriceError, Result};

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// A request to resolve the price of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    /// Card number such as `BLTR-EN051`
    #[serde(default)]
    pub card_number: String,
    /// Card name, which may embed an art-variant token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    /// Rarity as supplied by the caller (required for scraping)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_rarity: Option<String>,
    /// Explicit art-variant override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_variant: Option<String>,
    /// Skip the cache and always scrape
    #[serde(default)]
    pub force_refresh: bool,
}

impl PriceQuery {
    /// Create a query for the given card number.
    pub fn new(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            ..Self::default()
        }
    }

    /// Set the card name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.card_name = Some(name.into());
        self
    }

    /// Set the rarity.
    #[must_use]
    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.card_rarity = Some(rarity.into());
        self
    }

    /// Set an explicit art variant.
    #[must_use]
    pub fn with_art_variant(mut self, art_variant: impl Into<String>) -> Self {
        self.art_variant = Some(art_variant.into());
        self
    }

    /// Request a refresh that bypasses the cache.
    #[must_use]
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Trimmed card number, `None` when blank.
    #[must_use]
    pub fn number(&self) -> Option<&str> {
        Some(self.card_number.trim()).filter(|n| !n.is_empty())
    }

    /// Trimmed card name, `None` when absent or blank.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_empty(self.card_name.as_ref())
    }

    /// Trimmed rarity, `None` when absent or blank.
    #[must_use]
    pub fn rarity(&self) -> Option<&str> {
        non_empty(self.card_rarity.as_ref())
    }

    /// Trimmed explicit art variant, `None` when absent or blank.
    #[must_use]
    pub fn explicit_art_variant(&self) -> Option<&str> {
        non_empty(self.art_variant.as_ref())
    }

    /// Check that the query names a card at all.
    pub fn validate(&self) -> Result<()> {
        if self.number().is_none() && self.name().is_none() {
            return Err(PriceError::Validation(
                "either card_number or card_name must be provided".to_string(),
            ));
        }
        Ok(())
    }
}

/// Price fields scraped from a product page.
///
/// Every field is optional; a page yielding none of them is not usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFields {
    /// Primary marketplace price (TCG low)
    pub tcg_price: Option<f64>,
    /// Marketplace market price
    pub tcg_market_price: Option<f64>,
    /// Ungraded price
    pub pc_ungraded_price: Option<f64>,
    /// Grade 7 price
    pub pc_grade7: Option<f64>,
    /// Grade 8 price
    pub pc_grade8: Option<f64>,
    /// Grade 9 price
    pub pc_grade9: Option<f64>,
    /// Grade 9.5 price
    pub pc_grade9_5: Option<f64>,
    /// Grade 10 price
    pub pc_grade10: Option<f64>,
}

impl PriceFields {
    fn values(&self) -> [Option<f64>; 8] {
        [
            self.tcg_price,
            self.tcg_market_price,
            self.pc_ungraded_price,
            self.pc_grade7,
            self.pc_grade8,
            self.pc_grade9,
            self.pc_grade9_5,
            self.pc_grade10,
        ]
    }

    /// True when no price field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    /// Copy of these fields rounded to cents.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let round = |v: Option<f64>| v.map(|p| (p * 100.0).round() / 100.0);
        Self {
            tcg_price: round(self.tcg_price),
            tcg_market_price: round(self.tcg_market_price),
            pc_ungraded_price: round(self.pc_ungraded_price),
            pc_grade7: round(self.pc_grade7),
            pc_grade8: round(self.pc_grade8),
            pc_grade9: round(self.pc_grade9),
            pc_grade9_5: round(self.pc_grade9_5),
            pc_grade10: round(self.pc_grade10),
        }
    }
}

/// A cached price result for one card identity.
///
/// A record with `scrape_success == false` carries no prices and an
/// `error_message`. A successful record always has a non-empty
/// `card_number` and `card_rarity`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Card number
    pub card_number: String,
    /// Card name
    pub card_name: Option<String>,
    /// Normalized art variant (e.g. "7th")
    pub card_art_variant: Option<String>,
    /// Rarity as requested
    pub card_rarity: String,
    /// Set code derived from the card number
    pub set_code: Option<String>,
    /// Booster set name derived from the product URL
    pub booster_set_name: Option<String>,
    /// Scraped prices
    #[serde(flatten)]
    pub prices: PriceFields,
    /// Product page the prices came from
    pub source_url: Option<String>,
    /// When the record was produced
    pub last_price_updt: Option<DateTime<Utc>>,
    /// Whether the scrape yielded prices
    pub scrape_success: bool,
    /// Why the scrape failed
    pub error_message: Option<String>,
}

impl PriceRecord {
    /// Turn this record into a failure record, clearing all prices.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.prices = PriceFields::default();
        self.scrape_success = false;
        self.error_message = Some(message.into());
    }
}

/// One entry of a marketplace search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVariant {
    /// Raw listing title
    pub title: String,
    /// Locator the fetcher can resolve to a product page
    pub href: String,
}

impl CandidateVariant {
    /// Create a new candidate.
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}

/// What a marketplace search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A list of search results (possibly empty)
    Candidates(Vec<CandidateVariant>),
    /// The search redirected straight to a single product page
    ProductPage {
        /// Product page URL
        url: String,
    },
}

/// A marketplace search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text search terms
    pub text: String,
    /// Optional marketplace rarity facet
    pub rarity_filter: Option<String>,
}

impl SearchQuery {
    /// Create a search without a rarity facet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rarity_filter: None,
        }
    }

    /// Restrict results to a marketplace rarity.
    #[must_use]
    pub fn with_rarity_filter(mut self, rarity: Option<String>) -> Self {
        self.rarity_filter = rarity;
        self
    }
}

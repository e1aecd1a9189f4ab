//! Filters understood by [`PriceStore`](crate::PriceStore) implementations.

use chrono::{DateTime, Utc};

use crate::document::{parse_timestamp, PriceDocument};

/// How a single text field must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// Byte-for-byte equality
    Exact(String),
    /// Case-insensitive substring
    Contains(String),
    /// The field must be missing
    Absent,
}

impl FieldMatch {
    /// Whether a stored value satisfies this match. Missing values only
    /// satisfy [`FieldMatch::Absent`].
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Absent, v) => v.is_none(),
            (_, None) => false,
            (Self::Exact(expected), Some(v)) => v == expected,
            (Self::Contains(needle), Some(v)) => v.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Selects price documents for one card number.
///
/// The card number always matches exactly, ignoring case. The other fields
/// are optional constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFilter {
    /// Card number
    pub card_number: String,
    /// Optional card-name constraint
    pub card_name: Option<FieldMatch>,
    /// Optional rarity constraint
    pub card_rarity: Option<FieldMatch>,
    /// Optional art-variant constraint
    pub card_art_variant: Option<FieldMatch>,
}

impl PriceFilter {
    /// Filter on card number alone.
    pub fn new(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            card_name: None,
            card_rarity: None,
            card_art_variant: None,
        }
    }

    /// Add a card-name constraint.
    #[must_use]
    pub fn with_name(mut self, m: FieldMatch) -> Self {
        self.card_name = Some(m);
        self
    }

    /// Add a rarity constraint.
    #[must_use]
    pub fn with_rarity(mut self, m: FieldMatch) -> Self {
        self.card_rarity = Some(m);
        self
    }

    /// Add an art-variant constraint.
    #[must_use]
    pub fn with_art_variant(mut self, m: FieldMatch) -> Self {
        self.card_art_variant = Some(m);
        self
    }

    /// Identity key of a document: its card number plus every identity field
    /// it actually carries, matched exactly.
    ///
    /// A document without an art variant is the plain printing, so it only
    /// matches stored documents that also lack one.
    #[must_use]
    pub fn identity_of(doc: &PriceDocument) -> Self {
        Self {
            card_number: doc.card_number.clone(),
            card_name: doc.card_name.clone().map(FieldMatch::Exact),
            card_rarity: doc.card_rarity.clone().map(FieldMatch::Exact),
            card_art_variant: Some(
                doc.card_art_variant
                    .clone()
                    .map_or(FieldMatch::Absent, FieldMatch::Exact),
            ),
        }
    }

    /// Evaluate the filter against a document.
    #[must_use]
    pub fn matches(&self, doc: &PriceDocument) -> bool {
        let field_ok = |m: &Option<FieldMatch>, value: &Option<String>| {
            m.as_ref().map_or(true, |m| m.matches(value.as_deref()))
        };

        doc.card_number.eq_ignore_ascii_case(&self.card_number)
            && field_ok(&self.card_name, &doc.card_name)
            && field_ok(&self.card_rarity, &doc.card_rarity)
            && field_ok(&self.card_art_variant, &doc.card_art_variant)
    }
}

/// Selects documents for aggregate counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountFilter {
    /// Only documents updated strictly after this instant
    pub updated_after: Option<DateTime<Utc>>,
    /// Only documents with this outcome
    pub scrape_success: Option<bool>,
}

impl CountFilter {
    /// Evaluate the filter against a document.
    #[must_use]
    pub fn matches(&self, doc: &PriceDocument) -> bool {
        let recent = self.updated_after.map_or(true, |cutoff| {
            parse_timestamp(&doc.last_price_updt).is_some_and(|ts| ts > cutoff)
        });
        let outcome = self
            .scrape_success
            .map_or(true, |success| doc.scrape_success == success);
        recent && outcome
    }
}

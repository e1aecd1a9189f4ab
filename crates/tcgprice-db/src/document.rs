//! Stored form of a price record.
//!
//! The store keeps the timestamp as text exactly as written so that rows
//! produced by older writers (naive timestamps, HTTP-date strings) can still
//! be read. Blank identity fields are stored as NULL.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tcgprice_core::{PriceFields, PriceRecord};

/// Naive layouts accepted for legacy timestamps; interpreted as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A price record as persisted by a [`PriceStore`](crate::PriceStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceDocument {
    /// Card number (always present)
    pub card_number: String,
    /// Card name
    pub card_name: Option<String>,
    /// Normalized art variant
    pub card_art_variant: Option<String>,
    /// Rarity
    pub card_rarity: Option<String>,
    /// Set code
    pub set_code: Option<String>,
    /// Booster set name
    pub booster_set_name: Option<String>,
    /// Price fields
    pub prices: PriceFields,
    /// Product page URL
    pub source_url: Option<String>,
    /// Raw freshness timestamp
    pub last_price_updt: String,
    /// Whether the scrape yielded prices
    pub scrape_success: bool,
    /// Failure reason
    pub error_message: Option<String>,
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Canonical text form of a timestamp: RFC 3339, millisecond precision, `Z`.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (any offset), naive ISO-8601 date-times (taken as UTC)
/// and RFC 2822 / HTTP-date strings. Returns `None` for anything else.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

impl PriceDocument {
    /// Build the stored form of a record, dropping blank identity fields.
    #[must_use]
    pub fn from_record(record: &PriceRecord) -> Self {
        Self {
            card_number: record.card_number.trim().to_string(),
            card_name: present(record.card_name.as_ref()),
            card_art_variant: present(record.card_art_variant.as_ref()),
            card_rarity: present(Some(&record.card_rarity)),
            set_code: present(record.set_code.as_ref()),
            booster_set_name: present(record.booster_set_name.as_ref()),
            prices: record.prices,
            source_url: present(record.source_url.as_ref()),
            last_price_updt: format_timestamp(record.last_price_updt.unwrap_or_else(Utc::now)),
            scrape_success: record.scrape_success,
            error_message: record.error_message.clone(),
        }
    }

    /// Parsed freshness timestamp, `None` if unparseable.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_price_updt)
    }

    /// Convert back into the domain record.
    #[must_use]
    pub fn into_record(self) -> PriceRecord {
        let last_price_updt = self.timestamp();
        PriceRecord {
            card_number: self.card_number,
            card_name: self.card_name,
            card_art_variant: self.card_art_variant,
            card_rarity: self.card_rarity.unwrap_or_default(),
            set_code: self.set_code,
            booster_set_name: self.booster_set_name,
            prices: self.prices,
            source_url: self.source_url,
            last_price_updt,
            scrape_success: self.scrape_success,
            error_message: self.error_message,
        }
    }

    /// Fill identity fields this document lacks from an older version.
    ///
    /// Prices and outcome fields are not merged; the newer document wins.
    /// The art variant is part of the key and is never carried over.
    pub(crate) fn retain_identity_from(&mut self, previous: &Self) {
        fn keep(field: &mut Option<String>, previous: &Option<String>) {
            if field.is_none() {
                field.clone_from(previous);
            }
        }
        keep(&mut self.card_name, &previous.card_name);
        keep(&mut self.card_rarity, &previous.card_rarity);
        keep(&mut self.set_code, &previous.set_code);
        keep(&mut self.booster_set_name, &previous.booster_set_name);
    }
}

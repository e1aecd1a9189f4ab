//! tcgprice Matching - Text normalization and candidate selection.
//!
//! Marketplace listings spell rarities and art variants in many ways
//! ("Quarter-Century Secret Rare", "QCSR", "[7th Art]", ...). This crate turns
//! those strings into canonical forms and uses them to pick the listing that
//! best matches a requested card.
//!
//! Everything here is synchronous, allocation-light pure computation.
//!
//! # Example
//!
//! ```rust
//! use tcgprice_core::CandidateVariant;
//! use tcgprice_matching::{extract_art_variant, normalize_rarity, select_candidate};
//!
//! assert_eq!(
//!     normalize_rarity("Quarter-Century Secret Rare"),
//!     "quarter century secret rare"
//! );
//! assert_eq!(extract_art_variant("Dark Magician (7th Art)").as_deref(), Some("7"));
//!
//! let candidates = vec![
//!     CandidateVariant::new("Random Card - MRD-EN", "/product/1"),
//!     CandidateVariant::new("Target Card [Ultra Rare] TEST-EN016", "/product/2"),
//! ];
//! let best = select_candidate(&candidates, "TEST-EN016", Some("Ultra Rare"));
//! assert_eq!(best.map(|c| c.href.as_str()), Some("/product/2"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod art_variant;
pub mod identity;
pub mod rarity;
pub mod scorer;
pub mod search;
mod text;

pub use art_variant::{extract_art_variant, normalize_art_variant};
pub use identity::{extract_booster_set_name, extract_set_code};
pub use rarity::{
    expand_rarity_for_matching, marketplace_rarity_filter, normalize_rarity, title_mentions_rarity,
};
pub use scorer::{score_candidate, select_candidate, NUMBER_MATCH_SCORE, RARITY_MATCH_SCORE};
pub use search::{name_search_text, number_search_text};

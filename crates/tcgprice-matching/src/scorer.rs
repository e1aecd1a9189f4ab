//! Candidate scoring and selection.
//!
//! A listing earns [`NUMBER_MATCH_SCORE`] when its title contains the
//! requested card number and [`RARITY_MATCH_SCORE`] when it mentions the
//! requested rarity (or an alias of it). The highest score wins; ties go to
//! the earliest candidate.

use std::collections::BTreeSet;

use tcgprice_core::CandidateVariant;

use crate::rarity::{expand_rarity_for_matching, title_mentions_rarity};

/// Points for a card-number match.
pub const NUMBER_MATCH_SCORE: u32 = 100;

/// Points for a rarity match.
pub const RARITY_MATCH_SCORE: u32 = 50;

/// Score one listing title.
///
/// `rarity_aliases` is the output of
/// [`expand_rarity_for_matching`](crate::expand_rarity_for_matching); pass an
/// empty set when no rarity was requested.
#[must_use]
pub fn score_candidate(title: &str, card_number: &str, rarity_aliases: &BTreeSet<String>) -> u32 {
    let mut score = 0;

    let number = card_number.trim().to_lowercase();
    if !number.is_empty() && title.to_lowercase().contains(&number) {
        score += NUMBER_MATCH_SCORE;
    }

    if title_mentions_rarity(title, rarity_aliases) {
        score += RARITY_MATCH_SCORE;
    }

    score
}

/// Pick the candidate that best matches the requested card.
///
/// A single candidate is returned without scoring. When every candidate
/// scores zero the first one is returned as a best-effort guess; only an
/// empty list yields `None`.
#[must_use]
pub fn select_candidate<'a>(
    candidates: &'a [CandidateVariant],
    card_number: &str,
    card_rarity: Option<&str>,
) -> Option<&'a CandidateVariant> {
    match candidates {
        [] => return None,
        [only] => return Some(only),
        _ => {}
    }

    let aliases = card_rarity.map(expand_rarity_for_matching).unwrap_or_default();

    let mut best = &candidates[0];
    let mut best_score = 0;
    for candidate in candidates {
        let score = score_candidate(&candidate.title, card_number, &aliases);
        tracing::debug!("Candidate '{}' scored {}", candidate.title, score);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    if best_score == 0 {
        tracing::debug!(
            "No candidate matched {}; falling back to the first result",
            card_number
        );
    }

    Some(best)
}

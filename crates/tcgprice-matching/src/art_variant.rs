//! Art-variant extraction and normalization.
//!
//! Cards reprinted with alternate artwork carry a variant marker in their
//! listing name: numbered ("[7th Art]", "(1st art)", "-9th-art") or named
//! ("Arkana", "(Joey Wheeler)"). Numbered markers always win over named ones.

use regex::Regex;
use std::sync::OnceLock;

use crate::text::title_case;

const NUMBERED_PATTERNS: [&str; 9] = [
    r"(?i)\[(\d+)(st|nd|rd|th)?\s*art\]",
    r"(?i)\[(\d+)(st|nd|rd|th)?\s*quarter\s*century.*?\]",
    r"(?i)\[(\d+)(st|nd|rd|th)?\s*.*?secret.*?\]",
    r"(?i)\[(\d+)(st|nd|rd|th)?\]",
    r"(?i)\((\d+)(st|nd|rd|th)?\s*art\)",
    r"(?i)\b(\d+)(st|nd|rd|th)?\s*art\b",
    r"(?i)/(\d+)(st|nd|rd|th)?-(?:quarter-century|art)",
    r"(?i)magician-(\d+)(st|nd|rd|th)?-",
    r"(?i)-(\d+)(st|nd|rd|th)?-(?:quarter|art)",
];

const NAMED_PATTERNS: [&str; 8] = [
    r"(?i)\b(arkana)\b",
    r"(?i)\b(joey\s+wheeler)\b",
    r"(?i)\b(kaiba)\b",
    r"(?i)\b(pharaoh)\b",
    r"(?i)\b(anime)\b",
    r"(?i)\b(manga)\b",
    r"-([a-zA-Z]+(?:\s+[a-zA-Z]+)*)-",
    r"\(([a-zA-Z]+(?:\s+[a-zA-Z]+)*)\)",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

fn numbered_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(&NUMBERED_PATTERNS))
}

fn named_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile(&NAMED_PATTERNS))
}

/// Extract an art-variant marker from a card name.
///
/// Numbered variants return just the number ("7"); named variants are
/// returned title-cased ("Joey Wheeler"). Returns `None` if nothing matches.
#[must_use]
pub fn extract_art_variant(card_name: &str) -> Option<String> {
    if card_name.trim().is_empty() {
        return None;
    }

    for pattern in numbered_patterns() {
        if let Some(number) = pattern.captures(card_name).and_then(|c| c.get(1)) {
            tracing::debug!(
                "Detected numbered art variant {} using '{}' in {}",
                number.as_str(),
                pattern.as_str(),
                card_name
            );
            return Some(number.as_str().to_string());
        }
    }

    for pattern in named_patterns() {
        if let Some(name) = pattern.captures(card_name).and_then(|c| c.get(1)) {
            let variant = title_case(name.as_str().trim());
            tracing::debug!(
                "Detected named art variant '{}' using '{}' in {}",
                variant,
                pattern.as_str(),
                card_name
            );
            return Some(variant);
        }
    }

    None
}

/// Normalize an art variant for cache keys.
///
/// Bare numbers become ordinals ("7" → "7th", "22" → "22nd", "11" →
/// "11th"). Ordinals and named variants pass through trimmed. Blank input
/// means "no variant".
#[must_use]
pub fn normalize_art_variant(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("{trimmed}{}", ordinal_suffix(trimmed)));
    }

    Some(trimmed.to_string())
}

fn ordinal_suffix(digits: &str) -> &'static str {
    let teen = digits.ends_with("11") || digits.ends_with("12") || digits.ends_with("13");
    match digits.as_bytes().last() {
        Some(b'1') if !teen => "st",
        Some(b'2') if !teen => "nd",
        Some(b'3') if !teen => "rd",
        _ => "th",
    }
}

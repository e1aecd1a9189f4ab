//! Marketplace search text.

use crate::art_variant::normalize_art_variant;

/// Primary search text: the card number.
#[must_use]
pub fn number_search_text(card_number: &str) -> String {
    card_number.trim().to_string()
}

/// Fallback search text built from the card name.
///
/// A numeric art variant is appended as "`<n>th art`"-style text; a named
/// variant is appended as-is unless the name already contains it.
#[must_use]
pub fn name_search_text(card_name: &str, art_variant: Option<&str>) -> Option<String> {
    let name = card_name.trim();
    if name.is_empty() {
        return None;
    }

    let Some(variant) = art_variant.and_then(normalize_art_variant) else {
        return Some(name.to_string());
    };

    if variant.starts_with(|c: char| c.is_ascii_digit()) {
        let ordinal = variant
            .split_whitespace()
            .next()
            .unwrap_or(variant.as_str());
        Some(format!("{name} {ordinal} art"))
    } else if name.to_lowercase().contains(&variant.to_lowercase()) {
        Some(name.to_string())
    } else {
        Some(format!("{name} {variant}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_search_text() {
        assert_eq!(number_search_text(" BLTR-EN051 "), "BLTR-EN051");
    }

    #[test]
    fn test_name_search_text() {
        assert_eq!(name_search_text("Dark Magician", None).as_deref(), Some("Dark Magician"));
        assert_eq!(
            name_search_text("Dark Magician", Some("7")).as_deref(),
            Some("Dark Magician 7th art")
        );
        assert_eq!(
            name_search_text("Dark Magician", Some("7th Art")).as_deref(),
            Some("Dark Magician 7th art")
        );
        assert_eq!(
            name_search_text("Dark Magician", Some("Arkana")).as_deref(),
            Some("Dark Magician Arkana")
        );
        assert_eq!(
            name_search_text("Dark Magician (Arkana)", Some("Arkana")).as_deref(),
            Some("Dark Magician (Arkana)")
        );
        assert_eq!(name_search_text("  ", Some("7")), None);
    }
}

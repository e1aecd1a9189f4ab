//! Small string helpers shared by the normalizers.

/// Lower-case, fold `-`/`_` to spaces and collapse runs of whitespace.
pub(crate) fn fold(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first letter of every word (words split on spaces and `/`).
pub(crate) fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = ch.is_whitespace() || ch == '/';
    }
    out
}

/// Whether `needle` occurs in `haystack` delimited by non-alphanumeric
/// characters (or the ends of the string). Both inputs must already be
/// lower-cased.
pub(crate) fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Quarter-Century__Secret   RARE "), "quarter century secret rare");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ghost/gold rare"), "Ghost/Gold Rare");
        assert_eq!(title_case("collector's rare"), "Collector's Rare");
        assert_eq!(title_case("JOEY WHEELER"), "Joey Wheeler");
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("target card [ultra rare] test-en016", "ultra rare"));
        assert!(contains_token("dark magician (ur)", "ur"));
        assert!(!contains_token("your card", "ur"));
        assert!(!contains_token("anything", ""));
    }
}

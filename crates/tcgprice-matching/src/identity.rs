//! Card-identity helpers derived from card numbers and product URLs.

use url::Url;

use crate::text::title_case;

/// Longest set code accepted by [`extract_set_code`].
const MAX_SET_CODE_LEN: usize = 10;

/// Set code of a card number: the part before the first hyphen, upper-cased.
///
/// ```rust
/// use tcgprice_matching::extract_set_code;
///
/// assert_eq!(extract_set_code("bltr-en051").as_deref(), Some("BLTR"));
/// assert_eq!(extract_set_code("12345678"), None);
/// ```
#[must_use]
pub fn extract_set_code(card_number: &str) -> Option<String> {
    let (prefix, _) = card_number.trim().split_once('-')?;
    let prefix = prefix.trim();
    if prefix.is_empty()
        || prefix.len() > MAX_SET_CODE_LEN
        || !prefix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(prefix.to_ascii_uppercase())
}

/// Booster set name encoded in a marketplace product URL.
///
/// Product URLs end in a slug such as
/// `/product/530185/yugioh-battles-of-legend-terminal-revenge-dark-magician`.
/// The `yugioh-` prefix is dropped and so is the trailing card slug; the
/// remainder is title-cased. The card slug is located from `card_name` when
/// known, else from `listing_title`, whose leading words spell the card.
#[must_use]
pub fn extract_booster_set_name(
    product_url: &str,
    card_name: Option<&str>,
    listing_title: Option<&str>,
) -> Option<String> {
    let url = Url::parse(product_url).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "product")?;
    let _product_id = segments.next()?;
    let slug = segments.next()?.to_lowercase();

    let mut set_slug = slug.strip_prefix("yugioh-").unwrap_or(&slug).to_string();
    let name_slug = card_name.map(slugify).filter(|n| !n.is_empty());
    match name_slug {
        Some(name_slug) => {
            if let Some(pos) = set_slug.find(&format!("-{name_slug}")) {
                set_slug.truncate(pos);
            }
        }
        None => {
            if let Some(title) = listing_title {
                set_slug = strip_title_suffix(&set_slug, &slugify(title));
            }
        }
    }

    let words: Vec<&str> = set_slug.split('-').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return None;
    }
    Some(title_case(&words.join(" ")))
}

/// Drop the longest tail of `set_slug` that the title slug starts with.
/// At least one set word always survives.
fn strip_title_suffix(set_slug: &str, title_slug: &str) -> String {
    let set_words: Vec<&str> = set_slug.split('-').filter(|w| !w.is_empty()).collect();
    let title_words: Vec<&str> = title_slug.split('-').collect();

    let cut = (1..set_words.len()).find(|&start| {
        let tail = &set_words[start..];
        tail.len() <= title_words.len() && tail.iter().zip(&title_words).all(|(a, b)| a == b)
    });
    match cut {
        Some(start) => set_words[..start].join("-"),
        None => set_slug.to_string(),
    }
}

fn slugify(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_set_code() {
        assert_eq!(extract_set_code("BLTR-EN051").as_deref(), Some("BLTR"));
        assert_eq!(extract_set_code("ra04-en016").as_deref(), Some("RA04"));
        assert_eq!(extract_set_code("LOB-001").as_deref(), Some("LOB"));
        assert_eq!(extract_set_code("-001"), None);
        assert_eq!(extract_set_code("89631139"), None);
    }

    #[test]
    fn test_extract_booster_set_name() {
        let url =
            "https://www.tcgplayer.com/product/530185/yugioh-battles-of-legend-terminal-revenge-dark-magician";
        assert_eq!(
            extract_booster_set_name(url, Some("Dark Magician"), None).as_deref(),
            Some("Battles Of Legend Terminal Revenge")
        );
        assert_eq!(
            extract_booster_set_name(url, None, None).as_deref(),
            Some("Battles Of Legend Terminal Revenge Dark Magician")
        );
        assert_eq!(extract_booster_set_name("https://example.com/search?q=x", None, None), None);
        assert_eq!(extract_booster_set_name("not a url", None, None), None);
    }

    #[test]
    fn test_booster_set_name_from_listing_title() {
        let url = "https://www.tcgplayer.com/product/2/yugioh-battles-of-legend-terminal-revenge-target-card";
        assert_eq!(
            extract_booster_set_name(url, None, Some("Target Card BLTR-EN051 Secret Rare")).as_deref(),
            Some("Battles Of Legend Terminal Revenge")
        );
        assert_eq!(
            extract_booster_set_name(url, Some(""), Some("Target Card (Secret Rare)")).as_deref(),
            Some("Battles Of Legend Terminal Revenge")
        );
        // Title unrelated to the slug leaves it untouched.
        assert_eq!(
            extract_booster_set_name(url, None, Some("Something Else")).as_deref(),
            Some("Battles Of Legend Terminal Revenge Target Card")
        );
    }

    #[test]
    fn test_title_suffix_keeps_a_set_word() {
        assert_eq!(strip_title_suffix("revenge-revenge-x", "revenge-x-secret-rare"), "revenge");
        assert_eq!(strip_title_suffix("set-target-card", "target-card"), "set");
        assert_eq!(strip_title_suffix("target-card", "target-card"), "target-card");
    }
}

//! Rarity canonicalization and alias expansion.
//!
//! Rules are evaluated in a fixed order because several rarity names contain
//! each other ("platinum secret" must win over plain "platinum", "ghost/gold"
//! over plain "gold"). Every rule yields a form that maps back to itself, so
//! [`normalize_rarity`] is idempotent.

use std::collections::BTreeSet;

use crate::text::{contains_token, fold, title_case};

/// Canonicalize a rarity string.
///
/// The input is lower-cased, hyphens/underscores become spaces and
/// whitespace is collapsed. Known rarity families are then rewritten to one
/// canonical spelling. Anything unrecognized is returned in its folded form.
///
/// ```rust
/// use tcgprice_matching::normalize_rarity;
///
/// assert_eq!(normalize_rarity("25th Anniversary Secret Rare"), "quarter century secret rare");
/// assert_eq!(normalize_rarity("  Super   Rare "), "super rare");
/// ```
#[must_use]
pub fn normalize_rarity(raw: &str) -> String {
    let folded = fold(raw);
    match canonical_family(&folded) {
        Some(canonical) => canonical.to_string(),
        None => folded,
    }
}

/// Rarities recognized by a single token, checked in order.
const SPECIAL_RARITIES: [(&str, &str); 6] = [
    ("duel terminal", "duel terminal rare"),
    ("mosaic", "mosaic rare"),
    ("shatterfoil", "shatterfoil rare"),
    ("starfoil", "starfoil rare"),
    ("hobby league", "hobby league rare"),
    ("millennium", "millennium rare"),
];

fn canonical_family(n: &str) -> Option<&'static str> {
    let has = |token: &str| n.contains(token);

    if has("quarter century") || has("25th anniversary") {
        return Some(if has("secret") {
            "quarter century secret rare"
        } else if has("ultra") {
            "quarter century ultra rare"
        } else if has("rare") {
            "quarter century rare"
        } else {
            "quarter century"
        });
    }

    if has("platinum") && has("secret") {
        return Some("platinum secret rare");
    }

    if has("prismatic") {
        if has("secret") {
            return Some("prismatic secret rare");
        } else if has("collector") {
            return Some("prismatic collector's rare");
        } else if has("ultimate") {
            return Some("prismatic ultimate rare");
        }
    }

    if has("starlight") {
        return Some("starlight rare");
    }

    if has("collector") {
        return Some("collector's rare");
    }

    if has("ghost") {
        return Some(if has("gold") {
            "ghost/gold rare"
        } else {
            "ghost rare"
        });
    }

    if has("parallel") {
        return Some(if has("ultra") {
            "ultra parallel rare"
        } else if has("secret") {
            "parallel secret rare"
        } else {
            "parallel rare"
        });
    }

    if has("gold") {
        return Some(if has("premium") {
            "premium gold rare"
        } else {
            "gold rare"
        });
    }

    if has("platinum") {
        return Some("platinum rare");
    }

    if let Some(&(_, canonical)) = SPECIAL_RARITIES.iter().find(|(token, _)| n.contains(*token)) {
        return Some(canonical);
    }

    if has("20th") && has("secret") {
        return Some("20th secret rare");
    }

    None
}

/// Expand a rarity into every spelling a listing title might use.
///
/// The result holds the folded input, its canonical form and any known
/// abbreviations, deduplicated. An empty input yields an empty set.
///
/// ```rust
/// use tcgprice_matching::expand_rarity_for_matching;
///
/// let aliases = expand_rarity_for_matching("Ultra Rare");
/// assert!(aliases.contains("ultra"));
/// assert!(aliases.contains("ur"));
/// ```
#[must_use]
pub fn expand_rarity_for_matching(raw: &str) -> BTreeSet<String> {
    let folded = fold(raw);
    let mut aliases = BTreeSet::new();
    if folded.is_empty() {
        return aliases;
    }

    let canonical = normalize_rarity(&folded);
    let n = canonical.as_str();
    let has = |token: &str| n.contains(token);
    let mut add = |values: &[&str]| {
        aliases.extend(values.iter().map(|v| (*v).to_string()));
    };

    if has("quarter century") {
        if has("secret") {
            add(&[
                "qcsr",
                "25th anniversary secret rare",
                "quarter century secret",
                "qc secret rare",
            ]);
        } else if has("ultra") {
            add(&["qcur", "25th anniversary ultra rare"]);
        }
    }

    if has("platinum") {
        if has("secret") {
            add(&["psr", "plat secret rare"]);
        } else {
            add(&["platinum"]);
        }
    }

    if has("prismatic") {
        if has("secret") {
            add(&["prismatic secret"]);
        } else if has("collector") {
            add(&["prismatic collector rare"]);
        }
    }

    if has("starlight") {
        add(&["starlight"]);
    }

    if has("collector") {
        add(&["collector rare", "collectors rare"]);
    }

    if has("ghost") {
        if has("gold") {
            add(&["ghost gold rare"]);
        } else {
            add(&["ghost"]);
        }
    }

    if has("ultimate") {
        add(&["ultimate rare", "ultimate"]);
    }

    if has("parallel") {
        if has("ultra") {
            add(&["parallel ultra rare"]);
        } else if !has("secret") {
            add(&["parallel"]);
        }
    }

    if has("gold") {
        if has("premium") {
            add(&["premium gold"]);
        } else {
            add(&["gold rare", "gold"]);
        }
    }

    if has("secret rare") {
        add(&["secret", "sr"]);
    }
    if has("ultra rare") {
        add(&["ultra", "ur"]);
    }
    if has("super rare") {
        add(&["super", "sr"]);
    }
    if n == "rare" {
        add(&["r"]);
    }
    if n == "common" {
        add(&["c"]);
    }

    aliases.insert(folded);
    aliases.insert(canonical);
    aliases
}

/// Whether a listing title mentions the rarity or one of its aliases.
///
/// Aliases must appear as whole tokens, so the "ur" alias of Ultra Rare does
/// not match inside "your". Plural or glued spellings are not mentions
/// either: "Rares" does not mention Rare and "SecretRare" does not mention
/// Secret Rare.
#[must_use]
pub fn title_mentions_rarity(title: &str, aliases: &BTreeSet<String>) -> bool {
    let title = title.to_lowercase();
    aliases.iter().any(|alias| contains_token(&title, alias))
}

/// Rarity facet value used by the marketplace search page.
///
/// This is the canonical rarity in title case, e.g. "Quarter Century Secret
/// Rare". Returns `None` for a blank rarity.
#[must_use]
pub fn marketplace_rarity_filter(raw: &str) -> Option<String> {
    let canonical = normalize_rarity(raw);
    if canonical.is_empty() {
        None
    } else {
        Some(title_case(&canonical))
    }
}

use crate::error::{BrowserError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tcgprice_core::{CandidateVariant, PriceFields};
use url::Url;

/// Prices outside this range are treated as scraping noise
const MIN_PRICE: f64 = 0.01;
const MAX_PRICE: f64 = 10_000.0;

/// CSS selectors for one marketplace's page layout
#[derive(Debug, Clone)]
pub struct MarketplaceSelectors {
    /// One search result
    pub result_item: String,
    /// Title inside a result; the whole result text is used when absent
    pub result_title: Option<String>,
    /// Link inside a result
    pub result_link: String,
    /// Shown instead of results when the search found nothing
    pub no_results: Option<String>,
    /// Rows of label/value price tables on a product page
    pub price_rows: String,
    /// Headline listing price on a product page
    pub primary_price: Option<String>,
}

impl Default for MarketplaceSelectors {
    fn default() -> Self {
        Self {
            result_item: ".search-result".to_string(),
            result_title: None,
            result_link: "a[href]".to_string(),
            no_results: Some(".blank-slate".to_string()),
            price_rows: "tr".to_string(),
            primary_price: Some(".spotlight__price".to_string()),
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| BrowserError::InvalidSelector(format!("{css}: {e}")))
}

fn collapsed_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a price such as `$1,234.56`.
///
/// Returns `None` when no number is present or the value is implausible.
pub fn parse_price(text: &str) -> Option<f64> {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    let regex = PRICE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));

    let raw = regex.find(text)?.as_str().replace(',', "");
    let value: f64 = raw.parse().ok()?;
    (MIN_PRICE..=MAX_PRICE).contains(&value).then_some(value)
}

/// Extract candidates from a search results page.
pub fn parse_search_results(
    html: &str,
    base_url: &Url,
    selectors: &MarketplaceSelectors,
) -> Result<Vec<CandidateVariant>> {
    let document = Html::parse_document(html);

    if let Some(no_results) = &selectors.no_results {
        if document.select(&selector(no_results)?).next().is_some() {
            return Ok(Vec::new());
        }
    }

    let item_selector = selector(&selectors.result_item)?;
    let link_selector = selector(&selectors.result_link)?;
    let title_selector = selectors
        .result_title
        .as_deref()
        .map(selector)
        .transpose()?;

    let mut candidates = Vec::new();
    for item in document.select(&item_selector) {
        let href = if item.value().name() == "a" {
            item.value().attr("href")
        } else {
            item.select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
        };
        let Some(href) = href else {
            continue;
        };
        let Ok(href) = base_url.join(href) else {
            tracing::debug!("Skipping result with unusable link {}", href);
            continue;
        };

        let title = title_selector
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map_or_else(|| collapsed_text(&item), |el| collapsed_text(&el));

        candidates.push(CandidateVariant::new(title, href.to_string()));
    }

    tracing::debug!("Parsed {} search results", candidates.len());
    Ok(candidates)
}

fn assign_labelled_price(fields: &mut PriceFields, label: &str, value: f64) {
    let label = label.to_lowercase();
    let slot = if label.contains("market price") {
        &mut fields.tcg_market_price
    } else if label.contains("low") {
        &mut fields.tcg_price
    } else if label.contains("ungraded") {
        &mut fields.pc_ungraded_price
    } else if label.contains("9.5") {
        &mut fields.pc_grade9_5
    } else if label.contains("grade 10") || label.contains("psa 10") {
        &mut fields.pc_grade10
    } else if label.contains("grade 9") {
        &mut fields.pc_grade9
    } else if label.contains("grade 8") {
        &mut fields.pc_grade8
    } else if label.contains("grade 7") {
        &mut fields.pc_grade7
    } else {
        return;
    };
    // First occurrence wins
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Extract price fields from a product page.
pub fn parse_price_fields(html: &str, selectors: &MarketplaceSelectors) -> Result<PriceFields> {
    let document = Html::parse_document(html);
    let mut fields = PriceFields::default();

    let cell_selector = selector("th, td")?;
    for row in document.select(&selector(&selectors.price_rows)?) {
        let mut cells = row.select(&cell_selector).map(|c| collapsed_text(&c));
        let Some(label) = cells.next() else {
            continue;
        };
        if let Some(value) = cells.find_map(|text| parse_price(&text)) {
            assign_labelled_price(&mut fields, &label, value);
        }
    }

    if fields.tcg_price.is_none() {
        if let Some(primary) = &selectors.primary_price {
            fields.tcg_price = document
                .select(&selector(primary)?)
                .map(|el| collapsed_text(&el))
                .find_map(|text| parse_price(&text));
        }
    }

    Ok(fields.rounded())
}

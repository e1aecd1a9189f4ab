use crate::engine::PageSource;
use crate::error::BrowserError;
use crate::parse::{parse_price_fields, parse_search_results, MarketplaceSelectors};
use async_trait::async_trait;
use std::sync::Arc;
use tcgprice_core::{
    CandidateVariant, FetchError, Fetcher, PriceFields, SearchOutcome, SearchQuery,
};
use url::Url;

const SEARCH_PATH: &str = "/search/yugioh/product";

/// [`Fetcher`] for a TCGplayer-style marketplace
pub struct MarketplaceFetcher {
    pages: Arc<dyn PageSource>,
    base_url: Url,
    selectors: MarketplaceSelectors,
}

impl MarketplaceFetcher {
    pub fn new(pages: Arc<dyn PageSource>, base_url: &str) -> Result<Self, BrowserError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BrowserError::NavigationError(format!("Invalid base URL: {e}")))?;
        Ok(Self {
            pages,
            base_url,
            selectors: MarketplaceSelectors::default(),
        })
    }

    #[must_use]
    pub fn with_selectors(mut self, selectors: MarketplaceSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Search page URL for a query
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, BrowserError> {
        let mut url = self
            .base_url
            .join(SEARCH_PATH)
            .map_err(|e| BrowserError::NavigationError(format!("Invalid search URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("productLineName", "yugioh")
                .append_pair("q", query.text.trim())
                .append_pair("view", "grid");
            if let Some(rarity) = &query.rarity_filter {
                pairs.append_pair("RarityName", rarity);
            }
        }
        Ok(url)
    }

    fn resolve(&self, href: &str) -> Result<Url, FetchError> {
        self.base_url.join(href).map_err(|e| FetchError::Navigation {
            url: href.to_string(),
            reason: format!("invalid product link: {e}"),
        })
    }
}

/// Whether the marketplace redirected to a product page
fn is_product_page(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().starts_with("/product/"))
        .unwrap_or(false)
}

fn with_url(err: BrowserError, url: &Url) -> FetchError {
    match FetchError::from(err) {
        FetchError::Navigation { reason, .. } => FetchError::Navigation {
            url: url.to_string(),
            reason,
        },
        other => other,
    }
}

#[async_trait]
impl Fetcher for MarketplaceFetcher {
    async fn search_candidates(&self, query: &SearchQuery) -> Result<SearchOutcome, FetchError> {
        let url = self.search_url(query)?;
        tracing::info!("Searching marketplace for '{}'", query.text);

        let page = self
            .pages
            .fetch_page(url.as_str())
            .await
            .map_err(|e| with_url(e, &url))?;

        if is_product_page(&page.url) {
            tracing::info!("Search landed directly on product page {}", page.url);
            return Ok(SearchOutcome::ProductPage { url: page.url });
        }

        let candidates = parse_search_results(&page.html, &self.base_url, &self.selectors)?;
        Ok(SearchOutcome::Candidates(candidates))
    }

    async fn fetch_price_fields(
        &self,
        candidate: &CandidateVariant,
    ) -> Result<PriceFields, FetchError> {
        let url = self.resolve(&candidate.href)?;
        let page = self
            .pages
            .fetch_page(url.as_str())
            .await
            .map_err(|e| with_url(e, &url))?;

        Ok(parse_price_fields(&page.html, &self.selectors)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FetchedPage;
    use crate::error::Result;

    /// Serves canned pages, redirecting any search to `redirect` when set
    struct StaticPages {
        search_html: String,
        product_html: String,
        redirect: Option<String>,
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
            if url.contains(SEARCH_PATH) {
                if let Some(target) = &self.redirect {
                    return Ok(FetchedPage {
                        url: target.clone(),
                        html: self.product_html.clone(),
                    });
                }
                return Ok(FetchedPage {
                    url: url.to_string(),
                    html: self.search_html.clone(),
                });
            }
            if url.contains("/product/") {
                return Ok(FetchedPage {
                    url: url.to_string(),
                    html: self.product_html.clone(),
                });
            }
            Err(BrowserError::NavigationError("unexpected url".to_string()))
        }
    }

    fn fetcher(redirect: Option<&str>) -> MarketplaceFetcher {
        let pages = StaticPages {
            search_html: r#"
                <div class="search-result"><a href="/product/1/a">Card A BLTR-EN050</a></div>
                <div class="search-result"><a href="/product/2/b">Card B BLTR-EN051</a></div>
            "#
            .to_string(),
            product_html: r"<table><tr><td>Market Price</td><td>$4.20</td></tr></table>"
                .to_string(),
            redirect: redirect.map(str::to_string),
        };
        MarketplaceFetcher::new(Arc::new(pages), "https://www.tcgplayer.com").expect("fetcher")
    }

    #[test]
    fn test_search_url() {
        let query = SearchQuery::new("Dark Magician 7th art")
            .with_rarity_filter(Some("Quarter Century Secret Rare".to_string()));
        let url = fetcher(None).search_url(&query).expect("url");
        assert_eq!(url.path(), SEARCH_PATH);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "Dark Magician 7th art".to_string())));
        assert!(pairs.contains(&(
            "RarityName".to_string(),
            "Quarter Century Secret Rare".to_string()
        )));
    }

    #[tokio::test]
    async fn test_search_returns_candidates() {
        let outcome = fetcher(None)
            .search_candidates(&SearchQuery::new("BLTR-EN051"))
            .await
            .expect("search");
        let SearchOutcome::Candidates(candidates) = outcome else {
            panic!("expected candidates");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].href, "https://www.tcgplayer.com/product/2/b");
    }

    #[tokio::test]
    async fn test_search_redirect_to_product() {
        let outcome = fetcher(Some("https://www.tcgplayer.com/product/2/b"))
            .search_candidates(&SearchQuery::new("BLTR-EN051"))
            .await
            .expect("search");
        assert_eq!(
            outcome,
            SearchOutcome::ProductPage {
                url: "https://www.tcgplayer.com/product/2/b".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_price_fields() {
        let candidate = CandidateVariant::new("Card B", "/product/2/b");
        let fields = fetcher(None)
            .fetch_price_fields(&candidate)
            .await
            .expect("prices");
        assert_eq!(fields.tcg_market_price, Some(4.2));
    }

    #[tokio::test]
    async fn test_navigation_error_carries_url() {
        let candidate = CandidateVariant::new("Elsewhere", "/elsewhere");
        let err = fetcher(None)
            .fetch_price_fields(&candidate)
            .await
            .expect_err("unknown page");
        assert!(matches!(
            err,
            FetchError::Navigation { ref url, .. } if url == "https://www.tcgplayer.com/elsewhere"
        ));
    }
}

//! Resolution orchestrator.
//!
//! A resolution runs `cache check -> search -> select -> price fetch ->
//! persist`. A fresh cache hit ends it early and `force_refresh` skips the
//! cache check. Scrape failures are cached and returned as records with
//! `scrape_success == false`; only invalid queries, empty searches and
//! cancellation surface as errors.

use crate::cache::PriceCache;
use crate::error::{ResolveError, Result};
use crate::retry::{retry_fetch, RetryError, RetryPolicy};
use crate::singleflight::SingleFlight;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tcgprice_core::{
    AppConfig, CandidateVariant, FetchError, Fetcher, PriceError, PriceQuery, PriceRecord,
    SearchOutcome, SearchQuery,
};
use tcgprice_matching::{
    extract_art_variant, extract_booster_set_name, extract_set_code, marketplace_rarity_filter,
    name_search_text, normalize_art_variant, normalize_rarity, number_search_text,
    select_candidate,
};
use tokio_util::sync::CancellationToken;

/// Retry and search behaviour of a [`PriceResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Retry policy applied to each fetch step
    pub retry: RetryPolicy,
    /// Share one upstream resolution between identical concurrent requests
    pub coalesce_requests: bool,
    /// Search by card name when the number search finds nothing
    pub search_by_name_fallback: bool,
}

impl From<&AppConfig> for ResolverSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: config.scraping.max_attempts,
                delay: config.scraping.retry_delay(),
                timeout: config.scraping.fetch_timeout(),
            },
            coalesce_requests: config.scraping.coalesce_requests,
            search_by_name_fallback: config.scraping.search_by_name_fallback,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// A resolved price record plus cache metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceResolution {
    /// The record, successful or not
    #[serde(flatten)]
    pub record: PriceRecord,
    /// Whether the record came from the cache
    pub is_cached: bool,
    /// Age of the cached record in hours, zero for fresh scrapes
    pub cache_age_hours: f64,
    /// Non-fatal problem, e.g. the record could not be cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Why the record carries no prices
    #[serde(skip)]
    pub failure: Option<ResolveError>,
}

impl PriceResolution {
    fn cached(record: PriceRecord, cache_age_hours: f64) -> Self {
        let failure = (!record.scrape_success).then(|| ResolveError::DetailFetchFailed {
            reason: record
                .error_message
                .clone()
                .unwrap_or_else(|| "cached failure".to_string()),
            timed_out: false,
        });
        Self {
            record,
            is_cached: true,
            cache_age_hours,
            warning: None,
            failure,
        }
    }
}

/// A validated query with its art variant resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    card_number: Option<String>,
    card_name: Option<String>,
    card_rarity: Option<String>,
    art_variant: Option<String>,
    force_refresh: bool,
}

impl Identity {
    fn from_query(query: &PriceQuery) -> Result<Self> {
        query.validate().map_err(|e| match e {
            PriceError::Validation(msg) => ResolveError::InvalidQuery(msg),
            other => ResolveError::InvalidQuery(other.to_string()),
        })?;

        let art_variant = query
            .explicit_art_variant()
            .map(str::to_string)
            .or_else(|| query.name().and_then(extract_art_variant))
            .and_then(|raw| normalize_art_variant(&raw));

        Ok(Self {
            card_number: query.number().map(str::to_string),
            card_name: query.name().map(str::to_string),
            card_rarity: query.rarity().map(str::to_string),
            art_variant,
            force_refresh: query.force_refresh,
        })
    }

    /// Coalescing key: identical keys share one upstream resolution.
    fn flight_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.card_number.as_deref().unwrap_or_default().to_uppercase(),
            self.card_name.as_deref().unwrap_or_default().to_lowercase(),
            self.card_rarity
                .as_deref()
                .map(normalize_rarity)
                .unwrap_or_default(),
            self.art_variant.as_deref().unwrap_or_default(),
            self.force_refresh
        )
    }

    fn label(&self) -> &str {
        self.card_number
            .as_deref()
            .or(self.card_name.as_deref())
            .unwrap_or_default()
    }
}

/// Resolves price queries against the cache and the marketplace.
///
/// Cheap to clone; clones share the cache, fetcher and in-flight table.
#[derive(Clone)]
pub struct PriceResolver {
    cache: PriceCache,
    fetcher: Arc<dyn Fetcher>,
    settings: ResolverSettings,
    inflight: Arc<SingleFlight<String, Result<PriceResolution>>>,
}

impl PriceResolver {
    /// Create a resolver from explicitly constructed dependencies.
    #[must_use]
    pub fn new(cache: PriceCache, fetcher: Arc<dyn Fetcher>, settings: ResolverSettings) -> Self {
        Self {
            cache,
            fetcher,
            settings,
            inflight: Arc::new(SingleFlight::new()),
        }
    }

    /// The cache this resolver reads and writes.
    #[must_use]
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Resolve a query without external cancellation.
    pub async fn resolve(&self, query: &PriceQuery) -> Result<PriceResolution> {
        self.resolve_with_cancel(query, &CancellationToken::new())
            .await
    }

    /// Resolve a query, aborting promptly when `cancel` fires.
    ///
    /// A cancelled resolution persists nothing and returns
    /// [`ResolveError::Cancelled`].
    #[tracing::instrument(
        skip_all,
        fields(card_number = %query.card_number, rarity = ?query.card_rarity)
    )]
    pub async fn resolve_with_cancel(
        &self,
        query: &PriceQuery,
        cancel: &CancellationToken,
    ) -> Result<PriceResolution> {
        let identity = Identity::from_query(query)?;

        if !self.settings.coalesce_requests {
            return self.run(identity, cancel).await;
        }

        // The shared run has its own token; it is dropped, and its fetches
        // aborted, once every caller waiting on it has gone away.
        let key = identity.flight_key();
        let resolver = self.clone();
        let flight = self.inflight.run(key, move || async move {
            let cancel = CancellationToken::new();
            resolver.run(identity, &cancel).await
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Resolution cancelled by caller");
                Err(ResolveError::Cancelled)
            }
            outcome = flight => outcome,
        }
    }

    async fn run(&self, identity: Identity, cancel: &CancellationToken) -> Result<PriceResolution> {
        if identity.force_refresh {
            tracing::info!("Force refresh for {}, skipping cache", identity.label());
        } else if let Some(hit) = self.check_cache(&identity).await {
            return Ok(hit);
        }

        let Some(card_number) = identity.card_number.as_deref() else {
            return Err(ResolveError::InvalidQuery(
                "card_number is required to fetch prices".to_string(),
            ));
        };
        let Some(rarity) = identity.card_rarity.as_deref() else {
            return Err(ResolveError::InvalidQuery(
                "card_rarity is required to fetch prices".to_string(),
            ));
        };

        let (record, failure) = self.scrape(&identity, card_number, rarity, cancel).await?;

        if cancel.is_cancelled() {
            tracing::info!("Resolution of {} cancelled before persisting", card_number);
            return Err(ResolveError::Cancelled);
        }

        let warning = match self.cache.upsert(&record).await {
            Ok(_) => None,
            Err(e) => {
                let err = ResolveError::PersistFailed(e.to_string());
                tracing::warn!("{}", err);
                Some(err.to_string())
            }
        };

        Ok(PriceResolution {
            record,
            is_cached: false,
            cache_age_hours: 0.0,
            warning,
            failure,
        })
    }

    async fn check_cache(&self, identity: &Identity) -> Option<PriceResolution> {
        let card_number = identity.card_number.as_deref()?;

        match self
            .cache
            .lookup(
                card_number,
                identity.card_rarity.as_deref(),
                identity.art_variant.as_deref(),
            )
            .await
        {
            Ok(lookup) if lookup.is_fresh => {
                let age = lookup.age_hours().unwrap_or_default();
                let record = lookup.record?;
                tracing::info!("Cache hit for {} ({:.1}h old)", card_number, age);
                Some(PriceResolution::cached(record, age))
            }
            Ok(lookup) => {
                if lookup.record.is_some() {
                    tracing::info!("Cached record for {} is stale", card_number);
                } else {
                    tracing::info!("Cache miss for {}", card_number);
                }
                None
            }
            Err(e) => {
                tracing::warn!("Cache lookup failed for {}, treating as miss: {}", card_number, e);
                None
            }
        }
    }

    /// Search, select and fetch prices. Returns the record to persist and,
    /// for a failure record, the reason.
    async fn scrape(
        &self,
        identity: &Identity,
        card_number: &str,
        rarity: &str,
        cancel: &CancellationToken,
    ) -> Result<(PriceRecord, Option<ResolveError>)> {
        let record = PriceRecord {
            card_number: card_number.to_string(),
            card_name: identity.card_name.clone(),
            card_art_variant: identity.art_variant.clone(),
            card_rarity: rarity.to_string(),
            set_code: extract_set_code(card_number),
            last_price_updt: Some(Utc::now()),
            ..PriceRecord::default()
        };

        let candidates = match self.search(identity, card_number, rarity, cancel).await {
            Ok(candidates) => candidates,
            Err(RetryError::Cancelled) => return Err(ResolveError::Cancelled),
            Err(RetryError::Exhausted(e)) => return Ok(failed(record, fetch_failure(&e))),
        };

        let Some(selected) = select_candidate(&candidates, card_number, Some(rarity)) else {
            tracing::error!("No marketplace results for {}", card_number);
            return Err(ResolveError::NoCandidatesFound(card_number.to_string()));
        };
        tracing::info!("Selected '{}' for {}", selected.title, card_number);

        let fetcher = &self.fetcher;
        let prices = match retry_fetch(&self.settings.retry, "price fetch", cancel, move || {
            fetcher.fetch_price_fields(selected)
        })
        .await
        {
            Ok(prices) => prices,
            Err(RetryError::Cancelled) => return Err(ResolveError::Cancelled),
            Err(RetryError::Exhausted(e)) => return Ok(failed(record, fetch_failure(&e))),
        };

        let mut record = PriceRecord {
            source_url: Some(selected.href.clone()),
            booster_set_name: extract_booster_set_name(
                &selected.href,
                identity.card_name.as_deref(),
                Some(&selected.title),
            ),
            ..record
        };

        if prices.is_empty() {
            tracing::warn!("Product page for {} had no prices", card_number);
            let err = ResolveError::DetailFetchFailed {
                reason: "product page had no price fields".to_string(),
                timed_out: false,
            };
            return Ok(failed(record, err));
        }

        record.prices = prices.rounded();
        record.scrape_success = true;
        tracing::info!("Fetched prices for {}", card_number);
        Ok((record, None))
    }

    /// Search by number, then by name. An empty list means nothing matched.
    async fn search(
        &self,
        identity: &Identity,
        card_number: &str,
        rarity: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<CandidateVariant>, RetryError> {
        let rarity_filter = marketplace_rarity_filter(rarity);

        let mut texts = vec![number_search_text(card_number)];
        if self.settings.search_by_name_fallback {
            if let Some(text) = identity
                .card_name
                .as_deref()
                .and_then(|name| name_search_text(name, identity.art_variant.as_deref()))
            {
                texts.push(text);
            }
        }

        let fetcher = &self.fetcher;
        for text in texts {
            let query = SearchQuery::new(text).with_rarity_filter(rarity_filter.clone());
            let query = &query;
            let outcome = retry_fetch(&self.settings.retry, "search", cancel, move || {
                fetcher.search_candidates(query)
            })
            .await?;

            match outcome {
                SearchOutcome::ProductPage { url } => {
                    return Ok(vec![CandidateVariant::new(query.text.clone(), url)]);
                }
                SearchOutcome::Candidates(candidates) if !candidates.is_empty() => {
                    tracing::debug!("'{}' returned {} results", query.text, candidates.len());
                    return Ok(candidates);
                }
                SearchOutcome::Candidates(_) => {
                    tracing::info!("No results for '{}'", query.text);
                }
            }
        }

        Ok(Vec::new())
    }
}

fn fetch_failure(err: &FetchError) -> ResolveError {
    ResolveError::DetailFetchFailed {
        reason: err.to_string(),
        timed_out: err.is_timeout(),
    }
}

fn failed(mut record: PriceRecord, err: ResolveError) -> (PriceRecord, Option<ResolveError>) {
    tracing::error!("Scrape failed for {}: {}", record.card_number, err);
    let message = match &err {
        ResolveError::DetailFetchFailed { reason, .. } => reason.clone(),
        other => other.to_string(),
    };
    record.mark_failed(message);
    (record, Some(err))
}

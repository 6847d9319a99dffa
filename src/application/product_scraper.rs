//! Product scrape orchestration
//!
//! URL → site profile → fetch (per-host spacing, retries, rotated identity) →
//! parse → acceptance gate → upsert. Every call ends in a definite
//! [`ScrapeOutcome`]; nothing below this boundary escapes as an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::{FailureReason, ScrapeOutcome, ScrapeReport};
use crate::infrastructure::fetch_client::FetchClient;
use crate::infrastructure::parsing::{ParsingError, ProductPageParser, SiteProfiles};
use crate::infrastructure::product_repository::ProductStore;
use crate::infrastructure::proxy_pool::{ProxyPool, ProxyPoolCache};

/// Orchestration knobs that are not part of fetching itself
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub description_max_chars: usize,
    pub max_concurrency: usize,
    /// Pause a batch worker takes after each item
    pub item_delay: Duration,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            description_max_chars: 500,
            max_concurrency: 4,
            item_delay: Duration::from_secs(1),
        }
    }
}

pub struct ProductScraper {
    profiles: Arc<SiteProfiles>,
    fetcher: FetchClient,
    proxies: Arc<ProxyPoolCache>,
    store: Arc<dyn ProductStore>,
    settings: ScraperSettings,
}

impl ProductScraper {
    pub fn new(
        profiles: Arc<SiteProfiles>,
        fetcher: FetchClient,
        proxies: Arc<ProxyPoolCache>,
        store: Arc<dyn ProductStore>,
        settings: ScraperSettings,
    ) -> Self {
        Self {
            profiles,
            fetcher,
            proxies,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Scrape one product page and upsert it when title and price were found
    pub async fn scrape_product(&self, url: &str) -> ScrapeOutcome {
        let proxies = self.proxies.snapshot().await;
        self.scrape_with_pool(url, &proxies).await
    }

    /// [`scrape_product`](Self::scrape_product) in its serializable shape
    pub async fn scrape_report(&self, url: &str) -> ScrapeReport {
        self.scrape_product(url).await.into()
    }

    async fn scrape_with_pool(&self, url: &str, proxies: &ProxyPool) -> ScrapeOutcome {
        let page_url = match parse_page_url(url) {
            Ok(page_url) => page_url,
            Err(e) => {
                warn!("Rejecting {}: {}", url, e);
                return ScrapeOutcome::Failed(FailureReason::FetchFailed);
            }
        };

        let profile = self.profiles.for_url(&page_url);
        info!("🔍 Scraping {} with {} profile", url, profile.site);
        let page = match self.fetcher.fetch(&page_url, profile.site, proxies).await {
            Ok(page) => page,
            Err(e) => return ScrapeOutcome::Failed(e.reason()),
        };

        let fields = ProductPageParser::new(profile).parse(&page.body, &page_url);
        let Some(draft) = fields.to_draft(url, self.settings.description_max_chars) else {
            info!(
                "No usable product on {} (title: {}, price: {})",
                url,
                fields.title.is_some(),
                fields.normalized_price.is_some()
            );
            return ScrapeOutcome::NoData { fields };
        };

        match self.store.upsert_by_url(&draft).await {
            Ok(record) => {
                info!("💾 Stored {} at {} ({})", record.title, record.price, record.url);
                ScrapeOutcome::Stored { record, fields }
            }
            Err(e) => {
                error!("Failed to store product {}: {}", url, e);
                ScrapeOutcome::Failed(FailureReason::StorageFailed)
            }
        }
    }

    /// Scrape a batch; the map says which URLs ended up stored
    pub async fn scrape_many(&self, urls: &[String]) -> HashMap<String, bool> {
        self.scrape_many_with_cancellation(urls, CancellationToken::new())
            .await
    }

    /// Batch scrape that stops when `token` fires.
    ///
    /// Duplicate URLs are scraped once. Items not finished when the token
    /// fires are reported as `false`. Results complete in any order.
    pub async fn scrape_many_with_cancellation(
        &self,
        urls: &[String],
        token: CancellationToken,
    ) -> HashMap<String, bool> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        let proxies = self.proxies.refresh_if_stale().await;
        let item_delay = self.settings.item_delay;
        info!(
            "🚀 Starting batch of {} URLs (concurrency {}, {} proxies)",
            unique.len(),
            self.settings.max_concurrency,
            proxies.len()
        );

        let results: Vec<(String, bool)> = stream::iter(unique)
            .map(|url| {
                let proxies = Arc::clone(&proxies);
                let token = token.clone();
                async move {
                    if token.is_cancelled() {
                        debug!("Skipping {} after cancellation", url);
                        return (url, false);
                    }

                    let stored = tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            warn!("🛑 Scrape of {} cancelled", url);
                            false
                        }
                        outcome = self.scrape_with_pool(&url, &proxies) => outcome.is_success(),
                    };

                    if !item_delay.is_zero() {
                        tokio::select! {
                            _ = token.cancelled() => {}
                            _ = tokio::time::sleep(item_delay) => {}
                        }
                    }
                    (url, stored)
                }
            })
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        self.fetcher.throttle().retain_recent();

        let stored = results.iter().filter(|(_, ok)| *ok).count();
        info!("✅ Batch finished: {}/{} stored", stored, results.len());
        results.into_iter().collect()
    }
}

fn parse_page_url(url: &str) -> Result<Url, ParsingError> {
    let page_url = Url::parse(url).map_err(|e| ParsingError::invalid_page_url(url, e))?;
    if !matches!(page_url.scheme(), "http" | "https") || page_url.host_str().is_none() {
        return Err(ParsingError::invalid_page_url(url, "not an http(s) URL"));
    }
    Ok(page_url)
}

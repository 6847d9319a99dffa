//! Wiring of a [`ProductScraper`] from [`AppConfig`]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::product_scraper::{ProductScraper, ScraperSettings};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database_connection::DatabaseConnection;
use crate::infrastructure::fetch_client::FetchClient;
use crate::infrastructure::http_client::{ReqwestTransport, TransportConfig};
use crate::infrastructure::identity::IdentityRotator;
use crate::infrastructure::parsing::SiteProfiles;
use crate::infrastructure::product_repository::SqliteProductRepository;
use crate::infrastructure::proxy_pool::{ProxyPoolCache, ProxyServiceClient};
use crate::infrastructure::retry_policy::RetryPolicy;
use crate::infrastructure::site_throttle::SiteThrottle;

impl ScraperSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            description_max_chars: config.scraper.description_max_chars,
            max_concurrency: config.batch.max_concurrency,
            item_delay: config.batch.item_delay(),
        }
    }
}

/// Build the proxy cache and load its first snapshot. An unusable service URL
/// degrades to proxy-less fetching.
pub async fn build_proxy_cache(config: &AppConfig) -> Arc<ProxyPoolCache> {
    let refresh = Duration::from_secs(config.proxy.refresh_interval_seconds);
    let client = config.proxy.service_url.as_deref().and_then(|service_url| {
        let timeout = Duration::from_secs(config.proxy.request_timeout_seconds);
        match ProxyServiceClient::new(service_url, timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Proxy service disabled: {}", e);
                None
            }
        }
    });

    let cache = Arc::new(ProxyPoolCache::new(client, refresh));
    let pool = cache.load().await;
    info!("Proxy pool ready with {} proxies", pool.len());
    cache
}

impl ProductScraper {
    /// Open the database, compile profiles, and load the proxy pool
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let profiles = SiteProfiles::builtin()
            .context("Built-in extraction profiles are invalid")?
            .with_delay_overrides(&config.scraper.site_delay_overrides_ms);
        let throttle = SiteThrottle::from_profiles(&profiles);

        let db = DatabaseConnection::new(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.url))?;
        db.migrate().await.context("Failed to migrate database")?;
        let store = SqliteProductRepository::new(Arc::new(db.pool().clone()));

        let transport = ReqwestTransport::new(TransportConfig {
            max_redirects: config.scraper.max_redirects,
            accept_invalid_certs: config.scraper.accept_invalid_certs,
        })
        .context("Failed to build HTTP transport")?;
        let fetcher = FetchClient::new(
            Arc::new(transport),
            IdentityRotator::with_user_agents(config.scraper.user_agents.clone()),
            Arc::new(throttle),
            RetryPolicy::new(config.scraper.max_retries, config.scraper.backoff_unit()),
            config.scraper.request_timeout(),
        );

        let proxies = build_proxy_cache(config).await;

        Ok(Self::new(
            Arc::new(profiles),
            fetcher,
            proxies,
            Arc::new(store),
            ScraperSettings::from_config(config),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_with_temp_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", dir.path().join("products.db").display());

        let scraper = ProductScraper::from_config(&config).await.unwrap();
        assert_eq!(scraper.settings().description_max_chars, 500);
    }

    #[tokio::test]
    async fn test_invalid_proxy_service_url_means_no_proxies() {
        let mut config = AppConfig::default();
        config.proxy.service_url = Some("not a url".to_string());

        let cache = build_proxy_cache(&config).await;
        assert!(cache.snapshot().await.is_empty());
    }
}

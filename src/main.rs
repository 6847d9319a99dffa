//! Product Scraper binary
//!
//! Usage: `product-scraper <url>...`
//! Prints a JSON object mapping each URL to whether it was stored.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use product_scraper_lib::ProductScraper;
use product_scraper_lib::infrastructure::config::AppConfig;
use product_scraper_lib::infrastructure::logging::init_logging_with_config;

const CONFIG_PATH_ENV: &str = "PRODUCT_SCRAPER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/product-scraper";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path).context("Failed to load configuration")?;
    init_logging_with_config(config.logging.clone())?;

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        bail!("usage: product-scraper <url>...");
    }

    let scraper = ProductScraper::from_config(&config).await?;

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl-C received, cancelling remaining scrapes");
            ctrl_c_token.cancel();
        }
    });

    let results = scraper.scrape_many_with_cancellation(&urls, token).await;
    let ordered: BTreeMap<_, _> = results.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&ordered)?);

    info!("Done");
    Ok(())
}

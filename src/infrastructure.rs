//! Infrastructure layer for fetching, parsing, storage and ambient services
//!
//! This module provides the HTTP transport and retry machinery, identity and
//! proxy rotation, HTML parsing, the SQLite product store, configuration and
//! logging.

pub mod config;
pub mod database_connection;
pub mod fetch_client;
pub mod http_client;
pub mod identity;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod product_repository;
pub mod proxy_pool;
pub mod retry_policy;
pub mod site_throttle;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError};
pub use database_connection::DatabaseConnection;
pub use fetch_client::{FetchClient, FetchError, FetchedPage};
pub use http_client::{PageTransport, ReqwestTransport, TransportError, TransportResponse};
pub use identity::{Identity, IdentityRotator};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ParsingError, ParsingResult, SiteProfiles};
pub use product_repository::{ProductStore, SqliteProductRepository, StoreError};
pub use proxy_pool::{ProxyPool, ProxyPoolCache, ProxyServiceClient};
pub use retry_policy::RetryPolicy;
pub use site_throttle::SiteThrottle;

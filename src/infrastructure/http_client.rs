//! HTTP transport for product pages
//!
//! One GET per call with browser-like headers and the caller's identity.
//! Retry decisions live in the fetch client; this layer only reports what
//! happened.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::identity::Identity;

/// Transport-level failure; every variant is retryable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Single-request seam between the retry machine and the network
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_redirects: usize,
    /// Skips TLS certificate checks. Raises scrape success on misconfigured
    /// shops at the cost of exposing traffic to interception; keep off unless
    /// the target list is trusted.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            accept_invalid_certs: false,
        }
    }
}

/// reqwest-backed transport.
///
/// reqwest binds proxies at client build time, so one client is kept per
/// proxy URI next to the direct client.
pub struct ReqwestTransport {
    config: TransportConfig,
    direct: Client,
    proxied: Mutex<HashMap<String, Client>>,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        if config.accept_invalid_certs {
            warn!("⚠️ TLS certificate verification is disabled for product fetches");
        }
        let direct = Self::build_client(&config, None)?;
        Ok(Self {
            config,
            direct,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        // Accept-Encoding comes from reqwest's gzip/brotli/deflate features so
        // responses are still decompressed transparently
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
        headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
        headers
    }

    fn build_client(config: &TransportConfig, proxy: Option<&str>) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .default_headers(Self::browser_headers())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .cookie_store(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(proxy_uri) = proxy {
            let proxy = Proxy::all(proxy_uri).map_err(|e| TransportError::InvalidProxy {
                proxy: proxy_uri.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| TransportError::Connection(format!("failed to build HTTP client: {e}")))
    }

    fn client_for(&self, identity: &Identity) -> Result<Client, TransportError> {
        let Some(proxy) = identity.proxy.as_deref() else {
            return Ok(self.direct.clone());
        };

        let mut proxied = self
            .proxied
            .lock()
            .map_err(|_| TransportError::Connection("proxy client cache poisoned".to_string()))?;
        if let Some(client) = proxied.get(proxy) {
            return Ok(client.clone());
        }

        let client = Self::build_client(&self.config, Some(proxy))?;
        proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl PageTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let client = self.client_for(identity)?;
        debug!(
            "GET {} via {}",
            url,
            identity.proxy.as_deref().unwrap_or("direct")
        );

        let response = client
            .get(url)
            .header(header::USER_AGENT, identity.user_agent.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        debug!("{} -> HTTP {} ({} bytes)", url, status, body.len());
        Ok(TransportResponse { status, body })
    }
}

fn classify_reqwest_error(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Connection(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn identity() -> Identity {
        Identity::direct("test-agent/1.0")
    }

    #[tokio::test]
    async fn test_sends_identity_and_browser_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/p/1")
                    .header("user-agent", "test-agent/1.0")
                    .header("dnt", "1")
                    .header("sec-fetch-mode", "navigate");
                then.status(200).body("<h1>ok</h1>");
            })
            .await;

        let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
        let response = transport
            .get(&server.url("/p/1"), &identity(), Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, TransportResponse::new(200, "<h1>ok</h1>"));
    }

    #[tokio::test]
    async fn test_non_200_is_reported_not_raised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404).body("not found");
            })
            .await;

        let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
        let response = transport
            .get(&server.url("/gone"), &identity(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_millis(500));
            })
            .await;

        let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
        let err = transport
            .get(&server.url("/slow"), &identity(), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_invalid_proxy_rejected() {
        let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
        let identity = Identity {
            user_agent: "a".to_string(),
            proxy: Some("::not a proxy::".to_string()),
        };

        let err = transport
            .get("http://127.0.0.1:1/", &identity, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidProxy { .. }));
    }
}

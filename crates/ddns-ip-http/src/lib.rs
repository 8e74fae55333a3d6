// # HTTP IP Source
//
// This crate resolves the host's public IP address through an HTTP IP-echo
// service.
//
// ## Protocol
//
// `GET {url}` must answer with a 2xx status and a JSON body:
//
// ```json
// {"ip": "203.0.113.9"}
// ```
//
// The default endpoint is `https://api.ipify.org?format=json`.
//
// ## Failure Handling
//
// Every failure (transport, timeout, non-2xx, malformed body, missing or
// non-address `ip` field) collapses into `Error::IpResolution`. The engine
// treats that as "no answer this cycle".

use ddns_core::config::DEFAULT_IP_ECHO_URL;
use ddns_core::traits::IpSource;
use ddns_core::{DdnsConfig, Error, Result};

use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

/// Default timeout for IP echo requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the IP echo service
#[derive(Debug, Deserialize)]
struct IpEchoResponse {
    ip: String,
}

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: IP echo endpoint (e.g., "https://api.ipify.org?format=json")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create with a custom per-request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the engine configuration (`ip_echo_url`, `http_timeout_secs`)
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::with_timeout(config.ip_echo_url.clone(), config.http_timeout())
    }

    /// Create a source for the default public endpoint (ipify)
    pub fn ipify() -> Result<Self> {
        Self::new(DEFAULT_IP_ECHO_URL)
    }

    /// The endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_resolution(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_resolution(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_resolution(format!("Failed to read response: {}", e)))?;

        let echo: IpEchoResponse = serde_json::from_str(&body)
            .map_err(|e| Error::ip_resolution(format!("Malformed response: {}", e)))?;

        // Validate only; the received text is what gets compared and written
        if echo.ip.parse::<IpAddr>().is_err() {
            return Err(Error::ip_resolution(format!(
                "Invalid IP address: {:?}",
                echo.ip
            )));
        }

        Ok(echo.ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS system.
//
// ## Behavior
//
// - One HTTP request per trait call (GET to read, PUT to write)
// - No retry, backoff or caching: the engine's interval is the retry mechanism
// - HTTP timeout configured (30 seconds by default)
// - Readable error messages for common HTTP status codes (401/403, 404, 429, 5xx)
// - Dry-run mode: reads normally, logs the PUT it would have sent
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - DNS Record Details: GET `/zones/:zone_id/dns_records/:record_id`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::DEFAULT_API_BASE;
use ddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate, UpdateOutcome};
use ddns_core::{DdnsConfig, Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot. All coordination
/// (scheduling, comparison, failure handling) is owned by `DdnsEngine`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform GET requests
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (no trailing slash)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider against the public API
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Security
    ///
    /// The API token will NEVER be logged or displayed in error messages.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        Self::with_api_base(api_token, DEFAULT_API_BASE, DEFAULT_HTTP_TIMEOUT, dry_run)
    }

    /// Create a provider against a custom (Cloudflare-compatible) API base
    pub fn with_api_base(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create from the engine configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Self::with_api_base(
            config.api_key.clone(),
            config.api_base.clone(),
            config.http_timeout(),
            config.dry_run,
        )
    }

    /// Whether PUT requests are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone_id, record_id
        )
    }
}

/// Describe a non-success HTTP status the way operators need to read it
fn describe_status(status: StatusCode, body: &str) -> String {
    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Zone or DNS record not found. Status: {}", status),
        409 => format!(
            "Conflict: Record is being updated by another process. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Cloudflare server error (transient): {} - {}", status, body),
        _ => format!("{} - {}", status, body),
    }
}

fn join_messages(errors: &[ApiMessage]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Read a DNS record
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// ```
    async fn fetch_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord> {
        let url = self.record_url(zone_id, record_id);
        tracing::debug!("Fetching Cloudflare DNS record {}", record_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::record_fetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::record_fetch(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::record_fetch(describe_status(status, &body)));
        }

        let envelope: Envelope<DnsRecord> = serde_json::from_str(&body)
            .map_err(|e| Error::record_fetch(format!("Failed to parse response: {}", e)))?;

        match envelope.result {
            Some(record) => {
                tracing::debug!("Found record {} -> {}", record.name, record.content);
                Ok(record)
            }
            None if !envelope.success => Err(Error::record_fetch(format!(
                "API reported failure: {}",
                join_messages(&envelope.errors)
            ))),
            None => Err(Error::record_fetch(
                "Invalid response format: result is missing",
            )),
        }
    }

    /// Overwrite a DNS record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    ///
    /// {"type": "A", "name": "home.example.com", "content": "203.0.113.10"}
    /// ```
    ///
    /// Cloudflare answers validation failures with a 4xx status and a
    /// `success: false` envelope; those count as rejections, not transport
    /// failures.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateOutcome> {
        let url = self.record_url(zone_id, record_id);

        tracing::info!(
            "{} Cloudflare DNS record: {} -> {} ({}) [mode: {}]",
            if self.dry_run { "Would update" } else { "Updating" },
            update.name,
            update.content,
            update.record_type,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(update).unwrap_or_default()
            );
            return Ok(UpdateOutcome {
                success: true,
                response: Value::Null,
            });
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(update)
            .send()
            .await
            .map_err(|e| Error::update_transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::update_transport(format!("Failed to read response: {}", e)))?;

        let payload: Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(Error::update_transport(describe_status(status, &body)));
            }
            Err(e) => {
                return Err(Error::update_transport(format!(
                    "Failed to parse response: {}",
                    e
                )));
            }
        };

        match payload.get("success").and_then(Value::as_bool) {
            Some(true) if status.is_success() => Ok(UpdateOutcome {
                success: true,
                response: payload,
            }),
            Some(false) => Err(Error::update_rejected(payload)),
            _ => Err(Error::update_transport(describe_status(status, &body))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

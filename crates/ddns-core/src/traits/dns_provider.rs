// # DNS Provider Trait
//
// Defines the interface for reading and updating a single DNS record via a
// provider's HTTP management API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::traits::RecordUpdate;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let record = provider.fetch_record("zone-id", "record-id").await?;
//     if record.content != "203.0.113.10" {
//         let update = RecordUpdate::new("A", "home.example.com", "203.0.113.10");
//         provider.update_record("zone-id", "record-id", &update).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A DNS record as owned by the provider
///
/// Only `content` is required when deserializing; compatible APIs may omit
/// the descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record ID
    #[serde(default)]
    pub id: String,
    /// Record type (e.g. "A", "AAAA", "CNAME")
    #[serde(rename = "type", default)]
    pub record_type: String,
    /// Fully qualified record name
    #[serde(default)]
    pub name: String,
    /// Record content (the IP address for A/AAAA records)
    pub content: String,
}

/// Body of a record update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
}

impl RecordUpdate {
    pub fn new(
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Result of an accepted update request
///
/// Only used for logging; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// The provider's `success` flag
    pub success: bool,
    /// Raw provider response payload (`Null` in dry-run mode)
    pub response: serde_json::Value,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// Providers are isolated, stateless and single-shot:
/// - One HTTP request per method call
/// - No retry or backoff (the update interval is the retry mechanism)
/// - No decision about whether an update is needed (owned by `DdnsEngine`)
/// - No caching of record state between calls
///
/// # Error Mapping
///
/// - `fetch_record`: every failure is [`crate::Error::RecordFetch`]
/// - `update_record`: `success: false` is [`crate::Error::UpdateRejected`],
///   anything that prevents reading a `success` flag is
///   [`crate::Error::UpdateTransport`]
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Read the current state of a DNS record
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider zone identifier
    /// - `record_id`: Provider record identifier
    async fn fetch_record(&self, zone_id: &str, record_id: &str)
    -> Result<DnsRecord, crate::Error>;

    /// Overwrite a DNS record's type, name and content
    ///
    /// This is the only external mutation the system performs.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

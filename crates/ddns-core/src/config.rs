//! Configuration types for the DDNS system
//!
//! The configuration is supplied by the host (see `ddnsd`) and validated once
//! before the engine starts. The engine treats it as read-only.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Public IP echo service returning `{"ip": "..."}`
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org?format=json";

/// Main DDNS configuration
///
/// Describes exactly one DNS record to keep in sync with the public IP.
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Provider API token (sent as a bearer token)
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Provider zone identifier
    pub zone_id: String,

    /// Provider record identifier
    pub record_id: String,

    /// Record type sent verbatim on update (e.g. "A", "AAAA")
    pub record_type: String,

    /// Record name sent verbatim on update (e.g. "home.example.com")
    pub record_name: String,

    /// Seconds to sleep between reconciliation cycles
    pub update_interval_secs: u64,

    /// Provider API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Public IP echo endpoint
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Dry-run mode: read everything, write nothing
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the engine's monitoring event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl DdnsConfig {
    /// Create a configuration for one record with defaults for everything else
    pub fn new(
        api_key: impl Into<String>,
        zone_id: impl Into<String>,
        record_id: impl Into<String>,
        record_type: impl Into<String>,
        record_name: impl Into<String>,
        update_interval_secs: u64,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            zone_id: zone_id.into(),
            record_id: record_id.into(),
            record_type: record_type.into(),
            record_name: record_name.into(),
            update_interval_secs,
            api_base: default_api_base(),
            ip_echo_url: default_ip_echo_url(),
            http_timeout_secs: default_http_timeout_secs(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Override the provider API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the public IP echo endpoint
    pub fn with_ip_echo_url(mut self, url: impl Into<String>) -> Self {
        self.ip_echo_url = url.into();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Interval between the end of one cycle and the start of the next
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Per-request HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let required = [
            ("api_key", &self.api_key),
            ("zone_id", &self.zone_id),
            ("record_id", &self.record_id),
            ("record_type", &self.record_type),
            ("record_name", &self.record_name),
            ("api_base", &self.api_base),
            ("ip_echo_url", &self.ip_echo_url),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(crate::Error::config(format!("{} cannot be empty", field)));
            }
        }

        if self.update_interval_secs == 0 {
            return Err(crate::Error::config("update_interval_secs must be > 0"));
        }

        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("http_timeout_secs must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        Ok(())
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("api_key", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("record_id", &self.record_id)
            .field("record_type", &self.record_type)
            .field("record_name", &self.record_name)
            .field("update_interval_secs", &self.update_interval_secs)
            .field("api_base", &self.api_base)
            .field("ip_echo_url", &self.ip_echo_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("dry_run", &self.dry_run)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .finish()
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ip_echo_url() -> String {
    DEFAULT_IP_ECHO_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    100
}

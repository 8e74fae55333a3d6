// # ddnsd - DDNS Daemon
//
// Thin host for the reconciliation engine. All DDNS logic lives in ddns-core;
// this binary only:
// 1. Reads configuration from environment variables
// 2. Validates it and initializes logging
// 3. Builds the IP source, the Cloudflare provider and the engine
// 4. Runs the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS Provider
// - `DDNS_PROVIDER_API_TOKEN`: API token (required)
// - `DDNS_PROVIDER_ZONE_ID`: Zone ID (required)
// - `DDNS_PROVIDER_API_BASE`: API base URL (default: Cloudflare v4)
//
// ### Record
// - `DDNS_RECORD_ID`: Record ID (required)
// - `DDNS_RECORD_NAME`: Record name, e.g. home.example.com (required)
// - `DDNS_RECORD_TYPE`: Record type (default: A)
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: IP echo endpoint returning {"ip": "..."}
//
// ### Engine
// - `DDNS_UPDATE_INTERVAL`: Seconds between cycles (default: 300)
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request timeout (default: 30)
// - `DDNS_MODE`: Set to `dry-run` to skip writes
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DDNS_PROVIDER_API_TOKEN=your_token
// export DDNS_PROVIDER_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DDNS_RECORD_ID=372e67954025e0ba6aaa6d586b9e0b59
// export DDNS_RECORD_NAME=home.example.com
// export DDNS_UPDATE_INTERVAL=300
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::config::{DEFAULT_API_BASE, DEFAULT_IP_ECHO_URL};
use ddns_core::{DdnsConfig, DdnsEngine};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_api_token: String,
    provider_zone_id: String,
    provider_api_base: String,
    record_id: String,
    record_name: String,
    record_type: String,
    ip_source_url: String,
    update_interval: u64,
    http_timeout_secs: u64,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} is required. Set it via: export {}=...", key, key))
        };
        let optional = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a positive integer. Got: {}", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            provider_api_token: required("DDNS_PROVIDER_API_TOKEN")?,
            provider_zone_id: required("DDNS_PROVIDER_ZONE_ID")?,
            provider_api_base: optional("DDNS_PROVIDER_API_BASE", DEFAULT_API_BASE),
            record_id: required("DDNS_RECORD_ID")?,
            record_name: required("DDNS_RECORD_NAME")?,
            record_type: optional("DDNS_RECORD_TYPE", "A"),
            ip_source_url: optional("DDNS_IP_SOURCE_URL", DEFAULT_IP_ECHO_URL),
            update_interval: number("DDNS_UPDATE_INTERVAL", 300)?,
            http_timeout_secs: number("DDNS_HTTP_TIMEOUT_SECS", 30)?,
            dry_run: optional("DDNS_MODE", "").to_lowercase() == "dry-run",
            log_level: optional("DDNS_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    ///
    /// This performs:
    /// - Value format validation (API tokens, record names, URLs)
    /// - Numeric range validation
    /// - Log level validation
    fn validate(&self) -> Result<()> {
        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DDNS_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        validate_record_name(&self.record_name)?;

        if self.record_type.trim().is_empty() {
            anyhow::bail!("DDNS_RECORD_TYPE cannot be empty");
        }

        for (key, url) in [
            ("DDNS_IP_SOURCE_URL", &self.ip_source_url),
            ("DDNS_PROVIDER_API_BASE", &self.provider_api_base),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", key, url);
            }
        }

        if !(1..=86_400).contains(&self.update_interval) {
            anyhow::bail!(
                "DDNS_UPDATE_INTERVAL must be between 1 and 86400 seconds. Got: {}",
                self.update_interval
            );
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "DDNS_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the engine configuration
    fn to_ddns_config(&self) -> DdnsConfig {
        let mut config = DdnsConfig::new(
            self.provider_api_token.clone(),
            self.provider_zone_id.clone(),
            self.record_id.clone(),
            self.record_type.clone(),
            self.record_name.clone(),
            self.update_interval,
        )
        .with_api_base(self.provider_api_base.clone())
        .with_ip_echo_url(self.ip_source_url.clone())
        .with_dry_run(self.dry_run);
        config.http_timeout_secs = self.http_timeout_secs;
        config
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Validate that a string is a plausible DNS record name
///
/// Basic RFC 1035 checks; a leading `*.` wildcard label is allowed.
fn validate_record_name(name: &str) -> Result<()> {
    if name.len() > 253 {
        anyhow::bail!(
            "Record name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        );
    }

    let name = name.strip_prefix("*.").unwrap_or(name);
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() {
            anyhow::bail!("Record name has empty label: '{}'", name);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Record label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            anyhow::bail!(
                "Record label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Record label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Managing record {} ({}) every {}s",
        config.record_name, config.record_type, config.update_interval
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let ddns_config = config.to_ddns_config();

    let ip_source = HttpIpSource::from_config(&ddns_config)?;
    let provider = CloudflareProvider::from_config(&ddns_config)?;

    info!("IP source: {}", ip_source.url());
    info!("Provider: cloudflare ({})", ddns_config.api_base);

    let (engine, mut events) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), ddns_config)?;

    // Engine events duplicate the log output; keep the channel drained
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::trace!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle =
        tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    // The engine stops at its next idle point; an in-flight cycle finishes first
    let _ = shutdown_tx.send(());
    engine_handle
        .await
        .map_err(|e| anyhow::anyhow!("Engine task failed: {}", e))?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

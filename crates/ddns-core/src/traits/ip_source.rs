// # IP Source Trait
//
// Defines the interface for determining the host's public IP address.
//
// ## Implementations
//
// - HTTP IP echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let public_ip = source.current().await?;
//     println!("Public IP: {}", public_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for public IP resolvers
///
/// The engine calls [`IpSource::current`] once per reconciliation cycle.
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - One outbound request per call, no retries, no caching between calls
/// - The returned address is passed through untouched: it is compared
///   byte-for-byte against the provider's record content, so implementations
///   must not canonicalize it
/// - Every failure (transport, status, malformed body) is reported as
///   [`crate::Error::IpResolution`]
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The public IP as reported by the source
    /// - `Err(Error::IpResolution)`: If no answer could be obtained
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str {
        "unknown"
    }
}

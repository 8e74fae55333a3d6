//! Error types for the DDNS system
//!
//! Every network failure in a reconciliation cycle maps to exactly one
//! variant here. None of them is fatal: the engine logs them and moves on
//! to the next scheduled cycle.

use std::fmt;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The public IP could not be determined (transport, status, or body)
    #[error("IP resolution failed: {0}")]
    IpResolution(String),

    /// The DNS record could not be read from the provider
    #[error("DNS record fetch failed: {0}")]
    RecordFetch(String),

    /// The provider answered the update but reported `success: false`
    #[error("DNS update rejected by provider: {response}")]
    UpdateRejected {
        /// Raw provider response payload
        response: serde_json::Value,
    },

    /// The update request itself failed (network, HTTP, or unreadable body)
    #[error("DNS update transport failure: {0}")]
    UpdateTransport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an IP resolution error
    pub fn ip_resolution(msg: impl Into<String>) -> Self {
        Self::IpResolution(msg.into())
    }

    /// Create a record fetch error
    pub fn record_fetch(msg: impl Into<String>) -> Self {
        Self::RecordFetch(msg.into())
    }

    /// Create an update rejection carrying the provider's response
    pub fn update_rejected(response: serde_json::Value) -> Self {
        Self::UpdateRejected { response }
    }

    /// Create an update transport error
    pub fn update_transport(msg: impl Into<String>) -> Self {
        Self::UpdateTransport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error for logging and cycle outcomes
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IpResolution(_) => ErrorKind::IpResolutionFailed,
            Error::RecordFetch(_) => ErrorKind::RecordFetchFailed,
            Error::UpdateRejected { .. } => ErrorKind::UpdateRejected,
            Error::UpdateTransport(_) => ErrorKind::UpdateTransportFailed,
            Error::Config(_) => ErrorKind::ConfigInvalid,
        }
    }
}

/// Coarse failure classification reported in logs and engine events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IpResolutionFailed,
    RecordFetchFailed,
    UpdateRejected,
    UpdateTransportFailed,
    ConfigInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::IpResolutionFailed => "IPResolutionFailed",
            ErrorKind::RecordFetchFailed => "RecordFetchFailed",
            ErrorKind::UpdateRejected => "UpdateRejected",
            ErrorKind::UpdateTransportFailed => "UpdateTransportFailed",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

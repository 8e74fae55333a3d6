// # ddns-core
//
// Core library for the single-record DDNS updater.
//
// ## Architecture Overview
//
// This library keeps one DNS record in sync with the host's public IP:
// - **IpSource**: Trait for resolving the current public IP
// - **DnsProvider**: Trait for reading and updating a record via a provider API
// - **DdnsEngine**: Reconciler and scheduler loop (resolve → fetch → compare → update)
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Provider as Source of Truth**: Every cycle compares against the live record
// 3. **Non-fatal Failures**: A failed cycle is logged; the next one runs on schedule
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, CycleOutcome};
pub use config::DdnsConfig;
pub use error::{Error, ErrorKind, Result};

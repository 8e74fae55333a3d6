//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the current public IP via IpSource
//! - Reading the live DNS record via DnsProvider
//! - Updating the record when its content differs from the public IP
//! - Repeating the above on a fixed interval
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  Scheduler   │── every update_interval ──┐
//! └──────────────┘                           │
//!                                            ▼
//!                                   ┌──────────────┐
//!                                   │  DdnsEngine  │
//!                                   │ (reconcile)  │
//!                                   └──────────────┘
//!                                            │
//!         ┌──────────────────────────────────┼──────────────────────┐
//!         │                                  │                      │
//!         ▼                                  ▼                      ▼
//! ┌─────────────┐                   ┌──────────────┐        ┌─────────────┐
//! │  IpSource   │                   │ DnsProvider  │        │   Events    │
//! │ (resolve)   │                   │ (fetch/put)  │        │  (notify)   │
//! └─────────────┘                   └──────────────┘        └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve public IP (failure ends the cycle, no DNS calls)
//! 2. Fetch the live record (failure ends the cycle, no update)
//! 3. Compare by exact string equality (equal ends the cycle)
//! 4. Update the record once, no retry
//!
//! The comparison always uses the provider's record, never a remembered IP,
//! so out-of-band edits are corrected and restarts lose nothing.

use crate::config::DdnsConfig;
use crate::error::{ErrorKind, Result};
use crate::traits::{DnsProvider, IpSource, RecordUpdate};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        record_name: String,
        update_interval: Duration,
    },

    /// Public IP resolved for this cycle
    IpResolved { ip: String },

    /// DNS update skipped (record already matches)
    UpdateSkipped {
        record_name: String,
        current_ip: String,
    },

    /// DNS update succeeded
    UpdateSucceeded {
        record_name: String,
        previous_content: String,
        new_ip: String,
    },

    /// Cycle ended early or the update failed
    CycleFailed {
        record_name: String,
        kind: ErrorKind,
        error: String,
    },

    /// Engine stopped
    Stopped { reason: String },
}

/// Terminal state of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The record already holds the public IP
    Unchanged { ip: String },

    /// The record was rewritten
    Updated { previous: String, current: String },

    /// The cycle ended on a failure
    Failed { kind: ErrorKind },
}

/// Why the scheduler woke up between cycles
enum Wake {
    Elapsed,
    Shutdown,
    SenderDropped,
}

/// Core DDNS engine
///
/// The engine reconciles one DNS record against the host's public IP.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`] or [`DdnsEngine::run_with_shutdown()`]
/// 3. The loop runs until the host stops it
///
/// ## Threading
///
/// All network calls of a cycle are awaited sequentially on the caller's
/// task; cycles never overlap.
pub struct DdnsEngine {
    /// Public IP resolver
    ip_source: Box<dyn IpSource>,

    /// DNS provider
    provider: Box<dyn DnsProvider>,

    /// Target record
    zone_id: String,
    record_id: String,
    record_type: String,
    record_name: String,

    /// Sleep between cycles
    update_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: Public IP resolver
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let update_interval = config.update_interval();

        let engine = Self {
            ip_source,
            provider,
            zone_id: config.zone_id,
            record_id: config.record_id,
            record_type: config.record_type,
            record_name: config.record_name,
            update_interval,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the scheduler loop forever
    ///
    /// Termination is left to the surrounding process.
    pub async fn run(&self) {
        self.run_internal(None).await
    }

    /// Run the scheduler loop until `shutdown_rx` fires
    ///
    /// The signal is only observed between cycles: a cycle that has started
    /// always runs to its terminal state. Passing `None` runs forever, and a
    /// dropped sender is treated as "never stop".
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, mut shutdown_rx: Option<oneshot::Receiver<()>>) {
        info!(
            "Starting DDNS engine for {} ({}) every {:?} via {} / {}",
            self.record_name,
            self.record_type,
            self.update_interval,
            self.ip_source.source_name(),
            self.provider.provider_name()
        );
        self.emit_event(EngineEvent::Started {
            record_name: self.record_name.clone(),
            update_interval: self.update_interval,
        });

        loop {
            self.reconcile_once().await;

            let sleep = tokio::time::sleep(self.update_interval);
            tokio::pin!(sleep);

            let wake = match shutdown_rx.as_mut() {
                Some(rx) => tokio::select! {
                    _ = &mut sleep => Wake::Elapsed,
                    result = rx => match result {
                        Ok(()) => Wake::Shutdown,
                        Err(_) => Wake::SenderDropped,
                    },
                },
                None => {
                    (&mut sleep).await;
                    Wake::Elapsed
                }
            };

            match wake {
                Wake::Elapsed => {}
                Wake::Shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    return;
                }
                Wake::SenderDropped => {
                    debug!("Shutdown sender dropped, running until the process exits");
                    shutdown_rx = None;
                    sleep.await;
                }
            }
        }
    }

    /// Run one full reconciliation cycle
    ///
    /// Never fails: every error is logged, reported as an event and turned
    /// into [`CycleOutcome::Failed`].
    pub async fn reconcile_once(&self) -> CycleOutcome {
        // Step 1: Resolve public IP
        let public_ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Failed to get current public IP: {}", e);
                return self.fail(e.kind(), e.to_string());
            }
        };
        info!("Current public IP: {}", public_ip);
        self.emit_event(EngineEvent::IpResolved {
            ip: public_ip.clone(),
        });

        // Step 2: Fetch the live record
        let record = match self
            .provider
            .fetch_record(&self.zone_id, &self.record_id)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to get DNS record {}: {}", self.record_name, e);
                return self.fail(e.kind(), e.to_string());
            }
        };
        debug!(
            "Record {} ({}) currently points to {}",
            record.name, record.record_type, record.content
        );

        // Step 3: Compare
        if record.content == public_ip {
            info!(
                "Public IP has not changed ({}). No update needed.",
                public_ip
            );
            self.emit_event(EngineEvent::UpdateSkipped {
                record_name: self.record_name.clone(),
                current_ip: public_ip.clone(),
            });
            return CycleOutcome::Unchanged { ip: public_ip };
        }

        // Step 4: Apply
        info!(
            "Public IP has changed ({} -> {}). Updating DNS record {}.",
            record.content, public_ip, self.record_name
        );
        let update = RecordUpdate::new(&self.record_type, &self.record_name, &public_ip);

        match self
            .provider
            .update_record(&self.zone_id, &self.record_id, &update)
            .await
        {
            Ok(outcome) => {
                info!("DNS record updated successfully: {} -> {}", self.record_name, public_ip);
                debug!("Provider response: {}", outcome.response);
                self.emit_event(EngineEvent::UpdateSucceeded {
                    record_name: self.record_name.clone(),
                    previous_content: record.content.clone(),
                    new_ip: public_ip.clone(),
                });
                CycleOutcome::Updated {
                    previous: record.content,
                    current: public_ip,
                }
            }
            Err(e) => {
                error!(
                    "Failed to update DNS record {} ({}): {}",
                    self.record_name,
                    e.kind(),
                    e
                );
                self.fail(e.kind(), e.to_string())
            }
        }
    }

    fn fail(&self, kind: ErrorKind, error: String) -> CycleOutcome {
        self.emit_event(EngineEvent::CycleFailed {
            record_name: self.record_name.clone(),
            kind,
            error,
        });
        CycleOutcome::Failed { kind }
    }

    /// Emit an engine event
    ///
    /// Never blocks; a full or closed channel drops the event.
    fn emit_event(&self, event: EngineEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

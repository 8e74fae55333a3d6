//! Test doubles and common utilities for engine contract tests
//!
//! The doubles count every call so tests can assert exactly which network
//! operations a cycle performed.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate, UpdateOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
pub const RECORD_ID: &str = "372e67954025e0ba6aaa6d586b9e0b59";
pub const RECORD_NAME: &str = "home.example.com";

/// An IpSource that replays scripted answers
///
/// When the script runs out, the last answer is repeated.
#[derive(Clone)]
pub struct ScriptedIpSource {
    answers: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    last: Arc<Mutex<std::result::Result<String, String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always answer with `ip`
    pub fn fixed(ip: &str) -> Self {
        Self::scripted(vec![Ok(ip.to_string())])
    }

    /// Always fail
    pub fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(message.to_string())])
    }

    pub fn scripted(answers: Vec<std::result::Result<String, String>>) -> Self {
        let last = answers
            .last()
            .cloned()
            .unwrap_or_else(|| Err("no scripted answer".to_string()));
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            last: Arc::new(Mutex::new(last)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.lock().unwrap().clone());
        answer.map_err(Error::ip_resolution)
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// How the mock provider answers update requests
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    Accept,
    Reject,
    TransportFailure,
}

/// A mock DnsProvider holding one record in memory
///
/// Clones share counters and state, so a test can keep a handle while the
/// engine owns a boxed copy.
#[derive(Clone)]
pub struct MockDnsProvider {
    record: Arc<Mutex<DnsRecord>>,
    fetch_fails: Arc<Mutex<bool>>,
    update_behavior: Arc<Mutex<UpdateBehavior>>,
    fetch_call_count: Arc<AtomicUsize>,
    update_call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<RecordUpdate>>>,
}

impl MockDnsProvider {
    /// A provider whose record currently points at `content`
    pub fn with_content(content: &str) -> Self {
        Self {
            record: Arc::new(Mutex::new(DnsRecord {
                id: RECORD_ID.to_string(),
                record_type: "A".to_string(),
                name: RECORD_NAME.to_string(),
                content: content.to_string(),
            })),
            fetch_fails: Arc::new(Mutex::new(false)),
            update_behavior: Arc::new(Mutex::new(UpdateBehavior::Accept)),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_fetch_fails(&self, fails: bool) {
        *self.fetch_fails.lock().unwrap() = fails;
    }

    pub fn set_update_behavior(&self, behavior: UpdateBehavior) {
        *self.update_behavior.lock().unwrap() = behavior;
    }

    /// Simulate an out-of-band edit of the record
    pub fn set_content(&self, content: &str) {
        self.record.lock().unwrap().content = content.to_string();
    }

    pub fn content(&self) -> String {
        self.record.lock().unwrap().content.clone()
    }

    /// Get the number of times fetch_record() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Get every update body the engine sent
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn fetch_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);
        assert_eq!(record_id, RECORD_ID);

        if *self.fetch_fails.lock().unwrap() {
            return Err(Error::record_fetch("HTTP 503 Service Unavailable"));
        }
        Ok(self.record.lock().unwrap().clone())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateOutcome> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);
        assert_eq!(record_id, RECORD_ID);
        self.updates.lock().unwrap().push(update.clone());

        let behavior = self.update_behavior.lock().unwrap().clone();
        match behavior {
            UpdateBehavior::Accept => {
                self.set_content(&update.content);
                Ok(UpdateOutcome {
                    success: true,
                    response: serde_json::json!({ "success": true }),
                })
            }
            UpdateBehavior::Reject => Err(Error::update_rejected(serde_json::json!({
                "success": false,
                "errors": [{ "code": 9005, "message": "Content for A record is invalid." }]
            }))),
            UpdateBehavior::TransportFailure => {
                Err(Error::update_transport("connection reset by peer"))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a config targeting the mock record
pub fn test_config(update_interval_secs: u64) -> ddns_core::DdnsConfig {
    ddns_core::DdnsConfig::new(
        "test-token",
        ZONE_ID,
        RECORD_ID,
        "A",
        RECORD_NAME,
        update_interval_secs,
    )
}

/// Drain every event currently buffered on the engine's channel
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<ddns_core::EngineEvent>,
) -> Vec<ddns_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

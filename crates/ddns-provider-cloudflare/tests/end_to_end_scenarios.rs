// End-to-end reconciliation scenarios: real HTTP resolver + real Cloudflare
// provider + engine, against wiremock standing in for both services.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ddns_core::{CycleOutcome, DdnsConfig, DdnsEngine, EngineEvent, ErrorKind};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;

const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
const RECORD_ID: &str = "372e67954025e0ba6aaa6d586b9e0b59";
const RECORD_NAME: &str = "home.example.com";

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    engine: DdnsEngine,
    events: tokio::sync::mpsc::Receiver<EngineEvent>,
}

async fn harness(update_interval_secs: u64) -> Harness {
    let server = MockServer::start().await;

    let config = DdnsConfig::new(
        "cf-test-token-0123456789abcdef",
        ZONE_ID,
        RECORD_ID,
        "A",
        RECORD_NAME,
        update_interval_secs,
    )
    .with_api_base(format!("{}/client/v4", server.uri()))
    .with_ip_echo_url(format!("{}/ip", server.uri()));

    let ip_source = HttpIpSource::with_timeout(config.ip_echo_url.clone(), Duration::from_millis(300))
        .unwrap();
    let provider = CloudflareProvider::from_config(&config).unwrap();

    let (engine, events) =
        DdnsEngine::new(Box::new(ip_source), Box::new(provider), config).unwrap();

    Harness {
        server,
        engine,
        events,
    }
}

fn record_path() -> String {
    format!("/client/v4/zones/{ZONE_ID}/dns_records/{RECORD_ID}")
}

fn record_envelope(content: &str) -> serde_json::Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": {
            "id": RECORD_ID,
            "type": "A",
            "name": RECORD_NAME,
            "content": content
        }
    })
}

async fn mount_ip(server: &MockServer, ip: &str) {
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": ip })))
        .mount(server)
        .await;
}

async fn mount_record(server: &MockServer, content: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(record_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_envelope(content)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_no_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path(record_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(server)
        .await;
}

fn drain(events: &mut tokio::sync::mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_matching_record_is_left_alone() {
    let mut h = harness(300).await;
    mount_ip(&h.server, "203.0.113.9").await;
    mount_record(&h.server, "203.0.113.9", 1).await;
    mount_no_put(&h.server).await;

    let outcome = h.engine.reconcile_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Unchanged {
            ip: "203.0.113.9".to_string()
        }
    );
    assert!(drain(&mut h.events)
        .iter()
        .any(|e| matches!(e, EngineEvent::UpdateSkipped { .. })));
    h.server.verify().await;
}

#[tokio::test]
async fn scenario_b_changed_ip_is_pushed() {
    let mut h = harness(300).await;
    mount_ip(&h.server, "203.0.113.10").await;
    mount_record(&h.server, "203.0.113.9", 1).await;

    Mock::given(method("PUT"))
        .and(path(record_path()))
        .and(body_json(json!({
            "type": "A",
            "name": "home.example.com",
            "content": "203.0.113.10"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_envelope("203.0.113.10")))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h.engine.reconcile_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Updated {
            previous: "203.0.113.9".to_string(),
            current: "203.0.113.10".to_string(),
        }
    );
    assert!(drain(&mut h.events).contains(&EngineEvent::UpdateSucceeded {
        record_name: RECORD_NAME.to_string(),
        previous_content: "203.0.113.9".to_string(),
        new_ip: "203.0.113.10".to_string(),
    }));
    h.server.verify().await;
}

#[tokio::test]
async fn scenario_c_resolution_timeout_makes_no_dns_calls() {
    let mut h = harness(1).await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ip": "203.0.113.10" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&h.server)
        .await;
    mount_record(&h.server, "203.0.113.9", 0).await;
    mount_no_put(&h.server).await;

    let outcome = h.engine.reconcile_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Failed {
            kind: ErrorKind::IpResolutionFailed
        }
    );
    assert!(drain(&mut h.events).iter().any(|e| matches!(
        e,
        EngineEvent::CycleFailed {
            kind: ErrorKind::IpResolutionFailed,
            ..
        }
    )));
    h.server.verify().await;
}

#[tokio::test]
async fn scenario_c_loop_schedules_next_cycle_after_timeout() {
    let Harness {
        server,
        engine,
        mut events,
    } = harness(1).await;

    // Every resolution times out; the loop must keep cycling regardless
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ip": "203.0.113.10" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_record(&server, "203.0.113.9", 0).await;
    mount_no_put(&server).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move { engine.run_with_shutdown(Some(shutdown_rx)).await });

    // Two cycles: 300ms timeout + 1s sleep + 300ms timeout, with slack
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let failures = drain(&mut events)
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                EngineEvent::CycleFailed {
                    kind: ErrorKind::IpResolutionFailed,
                    ..
                }
            )
        })
        .count();
    assert!(failures >= 2, "expected at least two failed cycles, got {failures}");
    server.verify().await;
}

#[tokio::test]
async fn record_fetch_failure_skips_update() {
    let h = harness(300).await;
    mount_ip(&h.server, "203.0.113.10").await;

    Mock::given(method("GET"))
        .and(path(record_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 81044, "message": "Record does not exist." }],
            "result": null
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_no_put(&h.server).await;

    let outcome = h.engine.reconcile_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Failed {
            kind: ErrorKind::RecordFetchFailed
        }
    );
    h.server.verify().await;
}

#[tokio::test]
async fn rejected_update_is_reported_not_raised() {
    let h = harness(300).await;
    mount_ip(&h.server, "203.0.113.10").await;
    mount_record(&h.server, "203.0.113.9", 1).await;

    Mock::given(method("PUT"))
        .and(path(record_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 9005, "message": "Content for A record is invalid." }]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h.engine.reconcile_once().await;

    assert_eq!(
        outcome,
        CycleOutcome::Failed {
            kind: ErrorKind::UpdateRejected
        }
    );
    h.server.verify().await;
}

mod common;

use std::time::Duration;

use common::{FakeDevice, REPORT, fast_poll, wait_for_readings};
use serde_json::Value;
use telemetry_bridge::api::{self, AppState};
use telemetry_bridge::{Driver, DriverHandle, Latest};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

struct Harness {
    base: String,
    latest: Latest,
    device: FakeDevice,
    cancel: CancellationToken,
}

async fn harness() -> Harness {
    let mut device = FakeDevice::bind(REPORT, Duration::from_millis(5)).await;
    let latest = Latest::new();
    let cancel = CancellationToken::new();

    let driver = Driver::connect(&device.device_config(1000), &fast_poll(), latest.sinks()).await;
    let (handle, commands) = DriverHandle::channel(4, driver.subscribe());
    tokio::spawn(driver.run(commands, cancel.clone()));
    assert_eq!(device.expect(11).await, "#03E8030D0A");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::router(AppState {
        driver: handle,
        latest: latest.clone(),
    });
    let cancel_for_http = cancel.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel_for_http.cancelled().await })
            .await
            .unwrap();
    });

    Harness {
        base: format!("http://{addr}"),
        latest,
        device,
        cancel,
    }
}

#[tokio::test]
async fn health_reports_driver_state() {
    let h = harness().await;

    let body: Value = reqwest::get(format!("{}/health", h.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["connected"], true);
    assert_eq!(body["data"]["state"], "Started");
    assert_eq!(body["data"]["interval"], 1000);

    h.cancel.cancel();
}

#[tokio::test]
async fn start_and_stop_requests() {
    let mut h = harness().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/start", h.base))
        .json(&serde_json::json!({ "interval": 500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["result"], "Failure");

    let resp = client
        .post(format!("{}/stop", h.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["result"], "Success");
    assert_eq!(h.device.expect(7).await, "#090D0A");

    h.cancel.cancel();
}

#[tokio::test]
async fn malformed_start_body_is_rejected() {
    let h = harness().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/start", h.base))
        .body("{\"interval\": \"soon\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    h.cancel.cancel();
}

#[tokio::test]
async fn wide_interval_reaches_the_driver() {
    let h = harness().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/start", h.base))
        .json(&serde_json::json!({ "interval": 70000 }))
        .send()
        .await
        .unwrap();
    // Rejected as already started, not as a bad request.
    assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);

    h.cancel.cancel();
}

#[tokio::test]
async fn readings_expose_latest_values() {
    let h = harness().await;
    wait_for_readings(&h.latest, 5).await;

    let body: Value = reqwest::get(format!("{}/readings", h.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let readings = body["data"].as_array().unwrap();
    assert_eq!(readings.len(), 5);
    assert_eq!(readings[3]["topic"], "supply_voltage");
    assert_eq!(readings[3]["value"], 1000);
    assert_eq!(readings[4]["topic"], "yaw");
    assert_eq!(readings[4]["value"], -100);

    h.cancel.cancel();
}

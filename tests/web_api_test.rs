#![cfg(feature = "web")]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use safrasphere::config::Config;
use safrasphere::kiosk::{KioskCommand, KioskController, KioskHandle, Screen};
use safrasphere::providers::Providers;
use safrasphere::web::{AppState, build_router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn start_kiosk() -> (AppState, KioskHandle, tokio::task::JoinHandle<safrasphere::Result<()>>) {
    let config = Arc::new(Config::default());
    let sim = Providers::simulated(&config);
    let mut controller = KioskController::new(Arc::clone(&config), sim.providers);
    let handle = controller.handle();
    let task = tokio::spawn(async move { controller.run().await });
    (AppState::new(handle.clone(), sim.feed, config), handle, task)
}

async fn call(state: &AppState, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_ok() {
    let (state, _handle, _task) = start_kiosk();
    let (status, body) = call(&state, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn state_and_config_are_json() {
    let (state, _handle, _task) = start_kiosk();

    let (status, body) = call(&state, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["screen"], "Splash");
    assert!(json["charging"].is_object());

    let (status, body) = call(&state, "GET", "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["qr"]["valid_payload"], "SAFRASPHERE_CHARGER_KARUR_001");
    assert_eq!(json["charging"]["rate_per_kwh"], 12.0);

    let (status, body) = call(&state, "GET", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn scan_requires_open_camera_and_payload() {
    let (state, _handle, _task) = start_kiosk();

    let (status, _) = call(&state, "POST", "/api/scan", Some(r#"{"payload":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Still on the splash screen, nothing is watching the feed
    let (status, _) = call(
        &state,
        "POST",
        "/api/scan",
        Some(r#"{"payload":"SAFRASPHERE_CHARGER_KARUR_001"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn commands_are_accepted_while_running() {
    let (state, _handle, _task) = start_kiosk();
    for uri in ["/api/location", "/api/payment/confirm", "/api/exit", "/api/reset"] {
        let (status, _) = call(&state, "POST", uri, None).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{uri}");
    }
    let (status, _) = call(&state, "POST", "/api/visibility", Some(r#"{"visible":false}"#)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn commands_fail_after_shutdown() {
    let (state, handle, task) = start_kiosk();
    handle.send(KioskCommand::Shutdown).unwrap();
    task.await.unwrap().unwrap();

    let (status, body) = call(&state, "POST", "/api/location", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("stopped"));
}

#[tokio::test(start_paused = true)]
async fn scan_endpoint_drives_the_flow() {
    let (state, handle, _task) = start_kiosk();
    let mut ui = handle.subscribe_ui();
    tokio::time::timeout(
        Duration::from_secs(60),
        ui.wait_for(|s| s.screen == Screen::QrScan && s.camera_active),
    )
    .await
    .unwrap()
    .unwrap();

    let (status, _) = call(
        &state,
        "POST",
        "/api/scan",
        Some(r#"{"payload":"SAFRASPHERE_CHARGER_KARUR_001"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::timeout(
        Duration::from_secs(60),
        ui.wait_for(|s| s.screen == Screen::Location && s.active),
    )
    .await
    .unwrap()
    .unwrap();

    let (_, body) = call(&state, "GET", "/api/state", None).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["screen"], "Location");
    assert_eq!(json["camera_active"], false);
}

//! Axum-based HTTP API driving and observing the kiosk
//!
//! Commands are forwarded to the controller through a [`KioskHandle`]; state
//! is read from the handle's watch channels, so no handler ever blocks the
//! controller. The OpenAPI document and Swagger UI are only compiled in with
//! the `openapi` feature.

use crate::config::Config;
use crate::kiosk::{KioskCommand, KioskHandle};
use crate::providers::FrameFeed;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[cfg(feature = "openapi")]
use utoipa::{OpenApi, ToSchema};
#[cfg(feature = "openapi")]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub kiosk: KioskHandle,
    /// Frames injected through `/api/scan` reach the simulated camera here
    pub feed: FrameFeed,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(kiosk: KioskHandle, feed: FrameFeed, config: Arc<Config>) -> Self {
        Self {
            kiosk,
            feed,
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ScanBody {
    pub payload: String,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VisibilityBody {
    pub visible: bool,
}

/// Queue `command` and answer 202, or 503 once the controller has stopped
fn dispatch(state: &AppState, command: KioskCommand) -> (StatusCode, Json<serde_json::Value>) {
    match state.kiosk.send(command) {
        Ok(()) => (StatusCode::ACCEPTED, Json(serde_json::json!({"ok": true}))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/state", responses(
    (status = 200, description = "Current kiosk UI state")
)))]
pub async fn ui_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.kiosk.ui_state())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/events", responses((status = 200))))]
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::new(state.kiosk.subscribe_ui()).filter_map(|ui| {
        serde_json::to_string(&ui)
            .ok()
            .map(|json| Ok::<Event, std::convert::Infallible>(Event::default().event("state").data(json)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/config", responses((status = 200))))]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(state.config.as_ref())
        .unwrap_or(serde_json::json!({"error":"serialization"}));
    Json(json)
}

#[cfg(feature = "openapi")]
#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
pub async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/sessions", responses((status = 200))))]
pub async fn sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.kiosk.sessions())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/scan", request_body = ScanBody, responses(
    (status = 202, description = "Frame shown to the camera"),
    (status = 409, description = "No camera stream is open")
)))]
pub async fn scan(State(state): State<AppState>, Json(body): Json<ScanBody>) -> impl IntoResponse {
    if body.payload.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error":"empty payload"})),
        );
    }
    if state.feed.show_text(&body.payload) {
        (StatusCode::ACCEPTED, Json(serde_json::json!({"ok": true})))
    } else {
        (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error":"camera is not active"})),
        )
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/location", responses((status = 202))))]
pub async fn grant_location(State(state): State<AppState>) -> impl IntoResponse {
    dispatch(&state, KioskCommand::GrantLocation)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/payment/confirm", responses((status = 202))))]
pub async fn confirm_payment(State(state): State<AppState>) -> impl IntoResponse {
    dispatch(&state, KioskCommand::ConfirmPayment)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/exit", responses((status = 202))))]
pub async fn exit(State(state): State<AppState>) -> impl IntoResponse {
    dispatch(&state, KioskCommand::Exit)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/visibility", request_body = VisibilityBody, responses((status = 202))))]
pub async fn set_visibility(
    State(state): State<AppState>,
    Json(body): Json<VisibilityBody>,
) -> impl IntoResponse {
    dispatch(
        &state,
        KioskCommand::SetVisibility {
            visible: body.visible,
        },
    )
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/reset", responses((status = 202))))]
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    dispatch(&state, KioskCommand::Reset)
}

#[cfg(feature = "openapi")]
#[derive(OpenApi)]
#[openapi(
    paths(
        health, ui_state, events, get_config, get_config_schema, sessions,
        scan, grant_location, confirm_payment, exit, set_visibility, reset,
    ),
    components(schemas(ScanBody, VisibilityBody)),
    tags((name = "safrasphere", description = "SafraSphere kiosk API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(ui_state))
        .route("/api/events", get(events))
        .route("/api/config", get(get_config))
        .route("/api/sessions", get(sessions))
        .route("/api/scan", post(scan))
        .route("/api/location", post(grant_location))
        .route("/api/payment/confirm", post(confirm_payment))
        .route("/api/exit", post(exit))
        .route("/api/visibility", post(set_visibility))
        .route("/api/reset", post(reset));

    #[cfg(feature = "openapi")]
    let router = router
        .route("/api/config/schema", get(get_config_schema))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let (addr, parsed_ok): (SocketAddr, bool) = match host.parse::<IpAddr>() {
        Ok(ip) => (SocketAddr::new(ip, port), true),
        Err(_) => (([127, 0, 0, 1], port).into(), false),
    };
    if !parsed_ok {
        logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}

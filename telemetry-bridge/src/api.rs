use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::command::{CommandOutcome, DriverHandle};
use crate::sink::latest::Latest;

#[derive(Clone)]
pub struct AppState {
    pub driver: DriverHandle,
    pub latest: Latest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Missing means 0, the same as an empty service request.
    #[serde(default)]
    pub interval: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub result: CommandOutcome,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/readings", get(readings))
        .with_state(state)
}

// Helper to create success response
fn success_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    let api_response = ApiResponse {
        success: true,
        data: Some(data),
        message: None,
    };
    (status, Json(api_response)).into_response()
}

// Helper to create error response
fn error_response(status: StatusCode, message: String) -> Response {
    let api_response = ApiResponse::<()> {
        success: false,
        data: None,
        message: Some(message),
    };
    (status, Json(api_response)).into_response()
}

fn command_response(result: CommandOutcome) -> Response {
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };

    let api_response = ApiResponse {
        success: result.is_success(),
        data: Some(CommandResponse { result }),
        message: None,
    };
    (status, Json(api_response)).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    match state.driver.status() {
        Some(status) => success_response(StatusCode::OK, status),
        None => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Driver is not running".to_string(),
        ),
    }
}

async fn start(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        StartRequest::default()
    } else {
        match serde_json::from_slice::<StartRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid request: {e}"));
            }
        }
    };

    command_response(state.driver.start(request.interval).await)
}

async fn stop(State(state): State<AppState>) -> Response {
    command_response(state.driver.stop().await)
}

async fn readings(State(state): State<AppState>) -> Response {
    match state.latest.snapshot() {
        Ok(readings) => success_response(StatusCode::OK, readings),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

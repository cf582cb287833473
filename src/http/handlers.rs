use super::state::AppState;
use crate::error::RegistryError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AppendRecordingRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/recordings
/// List saved recordings in insertion order
pub async fn list_recordings(State(state): State<AppState>) -> impl IntoResponse {
    match state.registry.list().await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            error!("Failed to list recordings: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read the file")
        }
    }
}

/// POST /api/recordings
/// Append a recording name
pub async fn append_recording(
    State(state): State<AppState>,
    body: Result<Json<AppendRecordingRequest>, JsonRejection>,
) -> impl IntoResponse {
    let name = match body {
        Ok(Json(AppendRecordingRequest { name: Some(name) })) if !name.trim().is_empty() => name,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, "Name is required"),
        Err(rejection) => {
            warn!("Rejected append body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Name is required");
        }
    };

    match state.registry.append(&name).await {
        Ok(()) => {
            info!("Recording \"{}\" added", name);
            (
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "Recording added successfully".to_string(),
                }),
            )
                .into_response()
        }
        Err(RegistryError::Validation(message)) => {
            error_response(StatusCode::BAD_REQUEST, &message)
        }
        Err(e) => {
            error!("Failed to append recording: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write to the file")
        }
    }
}

/// Any other method on /api/recordings
pub async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST")],
        format!("Method {} Not Allowed", method),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

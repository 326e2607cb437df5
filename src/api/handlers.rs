use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::presenter::{DisplayState, EMPTY_INPUT};
use crate::sentiment::{ClassificationResult, FailureKind};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// One display state, ready for a UI to paint
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub state: &'static str,
    pub label: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Custom error type that implements IntoResponse
pub enum ApiError {
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

/// GET /api/health
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.classifier.backend_name().to_string(),
    })
}

/// POST /api/classify
/// Classifies one piece of text. Backend failures are reported in the body, not the status.
pub async fn classify(
    State(state): State<ApiState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidInput(EMPTY_INPUT.to_string()));
    }

    let result = state.classifier.classify(text).await;
    info!("Classified {} chars: {}", text.chars().count(), result);

    let failure_kind = match &result {
        ClassificationResult::Failure { kind, .. } => Some(*kind),
        _ => None,
    };
    if failure_kind.is_some_and(|kind| kind.is_network()) {
        warn!(
            "Sentiment backend '{}' unreachable",
            state.classifier.backend_name()
        );
    }
    let display = DisplayState::from(result);

    Ok(Json(ClassifyResponse {
        state: display.name(),
        label: display.label(),
        color: display.background().to_string(),
        notice: display.notice(),
        failure_kind,
    }))
}

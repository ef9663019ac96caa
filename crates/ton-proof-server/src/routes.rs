/*
[INPUT]:  HTTP requests from dApp frontends
[OUTPUT]: JSON challenge, session, and error responses
[POS]:    HTTP boundary - maps auth outcomes to status codes
[UPDATE]: When endpoints or status mapping change
*/

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use ton_proof_auth::{
    AuthOrchestrator, AuthOutcome, CheckProofRequest, CheckProofResponse, ErrorResponse,
    GeneratePayloadResponse, Rejection, SessionInfoResponse,
};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    auth: Arc<AuthOrchestrator>,
}

impl AppState {
    pub fn new(auth: AuthOrchestrator) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }
}

/// Failure body with its status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn bad_request() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request",
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized",
        }
    }
}

impl From<&Rejection> for ApiError {
    fn from(rejection: &Rejection) -> Self {
        let status = match rejection {
            Rejection::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
            Rejection::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: rejection.client_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/generatePayload", post(generate_payload))
        .route("/api/checkProof", post(check_proof))
        .route("/api/session", get(session))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate_payload(
    State(state): State<AppState>,
) -> Result<Json<GeneratePayloadResponse>, ApiError> {
    match state.auth.issue_challenge() {
        Ok(challenge) => Ok(Json(GeneratePayloadResponse {
            ton_proof: challenge.token,
        })),
        Err(e) => {
            warn!(error = %e, "failed to issue challenge");
            Err(ApiError::from(&Rejection::Internal))
        }
    }
}

/// Body is parsed by hand so that any JSON error maps to the uniform 400 body
async fn check_proof(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckProofResponse>, ApiError> {
    let request: CheckProofRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "unparseable checkProof body");
        ApiError::bad_request()
    })?;

    match state.auth.check_proof_request(request).await {
        AuthOutcome::Accepted(session) => Ok(Json(CheckProofResponse {
            token: session.token,
        })),
        AuthOutcome::Rejected(rejection) => Err(ApiError::from(&rejection)),
    }
}

async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionInfoResponse>, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)?;

    let claims = state.auth.validate_session(token).map_err(|e| {
        debug!(reason = %e, "session token rejected");
        ApiError::unauthorized()
    })?;

    Ok(Json(SessionInfoResponse {
        address: claims.data.address,
        network: claims.data.network,
        expires_at: claims.exp,
    }))
}

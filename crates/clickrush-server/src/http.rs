//! HTTP ingress: signup, click submission, winner query, participant lookup.
//!
//! Handlers translate engine outcomes to status codes; rejected clicks are a
//! 200 with `accepted: false`, while duplicate signups and missing
//! participants get their own codes. Payload validation happens here, before
//! anything reaches the coordinator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clickrush::store::{IdentityStore, InsertOutcome};
use clickrush::{ClickOutcome, CoordinatorHandle, ParticipantId, RejectReason, WinnerResolution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: CoordinatorHandle,
    pub store: Arc<dyn IdentityStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/signup", post(signup))
        .route("/click", post(click))
        .route("/winner", get(winner))
        .route("/participants/:id", get(participant))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub participant_id: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct SignupResponse {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRequest {
    pub participant_id: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ClickResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    if req.participant_id.is_empty() || req.address.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "participant_id and address are required".to_string(),
            }),
        )
            .into_response();
    }
    let id = ParticipantId::new(req.participant_id);
    match state.store.insert(&id, &req.address).await {
        Ok(InsertOutcome::Inserted) => {
            (StatusCode::CREATED, Json(SignupResponse { participant_id: id })).into_response()
        }
        Ok(InsertOutcome::Duplicate) => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: format!("participant {id} already exists"),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(participant = %id, error = %e, "signup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "identity store error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn click(State(state): State<AppState>, Json(req): Json<ClickRequest>) -> Response {
    if req.participant_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "participant_id is required".to_string(),
            }),
        )
            .into_response();
    }
    let id = ParticipantId::new(req.participant_id);
    match state.coordinator.submit_click(&id).await {
        Ok(outcome) => {
            let body = match outcome {
                ClickOutcome::Accepted => ClickResponse {
                    accepted: true,
                    reason: None,
                },
                ClickOutcome::Rejected(reason) => ClickResponse {
                    accepted: false,
                    reason: Some(reason),
                },
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            warn!(participant = %id, error = %e, "click submission failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn winner(State(state): State<AppState>) -> Response {
    match state.coordinator.query_winner().await {
        // Not-ended and none-eligible share a 404 but stay distinguishable
        // through the serialized status tag
        Ok(resolution) => {
            let status = match &resolution {
                WinnerResolution::Winner(_) => StatusCode::OK,
                _ => StatusCode::NOT_FOUND,
            };
            (status, Json(resolution)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "winner query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn participant(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = ParticipantId::new(id);
    match state.store.get(&id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("participant {id} not found"),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(participant = %id, error = %e, "participant lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "identity store error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

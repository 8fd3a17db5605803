//! HTTP surface: routing and the error envelope.
//!
//! Every failure leaving a handler is an [`ApiError`] carrying the stable
//! machine-readable code the wire contract promises; the mapping from
//! engine error kinds to status codes lives in one place here.

pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use roster_core::{EngineError, Resource};

use crate::AppState;

/// Build the service router.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/team/add", post(handlers::create_team))
        .route("/team/get", get(handlers::get_team))
        .route("/users/setIsActive", post(handlers::set_user_active))
        .route("/users/getReview", get(handlers::user_reviews))
        .route("/pullRequest/create", post(handlers::create_pr))
        .route("/pullRequest/merge", post(handlers::merge_pr))
        .route("/pullRequest/reassign", post(handlers::reassign_reviewer))
        .route("/stats", get(handlers::stats))
        .route("/teams/{team}/deactivate", post(handlers::deactivate_team))
        .with_state(state)
}

/// An error response: one stable code per failure kind, wrapped in the
/// `{"error": {"code", "message"}}` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let (status, code) = match &err {
            EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EngineError::AlreadyExists(Resource::Team) => {
                (StatusCode::BAD_REQUEST, "TEAM_EXISTS")
            }
            EngineError::AlreadyExists(_) => (StatusCode::CONFLICT, "PR_EXISTS"),
            EngineError::AlreadyMerged => (StatusCode::CONFLICT, "PR_MERGED"),
            EngineError::NotAssigned => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            EngineError::NoCandidate => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            EngineError::Internal(_) | EngineError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "engine operation failed");
        }

        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

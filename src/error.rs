use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::state::{roster::PlayerId, scheduler::InvalidTransition};

/// Reasons an inbound session event is dropped.
///
/// None of these is fatal: the session controller logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The event does not fit the current turn phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The event comes from an identity that is not on the roster.
    #[error("unknown player `{0}`")]
    UnknownPlayer(PlayerId),
    /// The identity already joined.
    #[error("player `{0}` already joined")]
    DuplicateIdentity(PlayerId),
    /// Only the current drawer may perform this action.
    #[error("player `{0}` is not the current drawer")]
    NotDrawer(PlayerId),
    /// A turn cannot be advanced without players.
    #[error("no players left to take a turn")]
    DegenerateRoster,
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The session event loop is no longer running.
    #[error("game session unavailable")]
    SessionClosed,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::SessionClosed => AppError::ServiceUnavailable(err.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

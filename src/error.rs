use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

/// Operation phase a validation rule is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Create => "create",
            Phase::Update => "update",
            Phase::Delete => "delete",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{field} must be non-empty on {phase}")]
    MissingField { field: &'static str, phase: Phase },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("upstream lookup failed: {0}")]
    Upstream(String),

    /// Schema defect in the merge engine: a readable field with no mutator.
    #[error("invalid properties on {entity}: field {field} has no mutator")]
    InvalidProperties {
        entity: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "validation",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Upstream(_) => "upstream",
            Self::InvalidProperties { .. } | Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                "internal"
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match self {
            Self::MissingField { .. } | Self::InvalidArgument(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": self.to_string(), "error": kind })),
            )
                .into_response(),
            Self::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": self.to_string(), "error": kind })),
            )
                .into_response(),
            Self::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": self.to_string(), "error": kind })),
            )
                .into_response(),
            Self::Upstream(_) => {
                let anchor = Uuid::now_v7();
                tracing::warn!(%anchor, error = %self, "dependency lookup failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "message": anchored("A dependency is unavailable", anchor),
                        "error": kind,
                        "anchor": anchor.to_string(),
                    })),
                )
                    .into_response()
            }
            _ => {
                let anchor = Uuid::now_v7();
                tracing::error!(%anchor, error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": anchored("An internal error has occurred", anchor),
                        "error": kind,
                        "anchor": anchor.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

fn anchored(message: &str, anchor: Uuid) -> String {
    format!(
        "{message}. Please try again later or contact technical support with the anchor. \
         anchor: {anchor}"
    )
}

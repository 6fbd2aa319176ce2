use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::cascade::{CascadeError, StoreError};

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `CONFLICT`,
    /// `EMAIL_TAKEN`, `RETRYABLE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title is required")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    /// Lost a lock or serialization race; nothing changed and the request
    /// can be repeated.
    Retryable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "Email is already taken".into(),
                },
            ),
            AppError::Retryable(detail) => {
                tracing::warn!("Retryable storage conflict: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "RETRYABLE",
                        message: "The resource is being modified concurrently, please retry"
                            .into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, AppError::Retryable(_));
        let (status, body) = self.status_and_body();

        if retryable {
            (status, [("Retry-After", "1")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        StoreError::from(err).into()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        CascadeError::from(err).into()
    }
}

impl From<CascadeError> for AppError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound { kind, id } => {
                AppError::NotFound(format!("{} {id} not found", kind_label(kind)))
            }
            CascadeError::NotDeletable(kind) => {
                AppError::Conflict(format!("{} cannot be deleted", kind_label(kind)))
            }
            CascadeError::Conflict(msg) => AppError::Retryable(msg),
            CascadeError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("Image exceeds the {limit} byte limit"))
            }
            StorageError::InvalidKey(msg) => AppError::Validation(format!("Invalid file: {msg}")),
            StorageError::NotFound(key) => AppError::NotFound(format!("File {key} not found")),
            StorageError::Io(e) => AppError::Internal(format!("Blob store I/O error: {e}")),
        }
    }
}

/// Map a unique-index violation to `on_duplicate`. Every other database
/// error keeps its usual mapping.
pub fn unique_violation(err: DbErr, on_duplicate: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => on_duplicate(),
        _ => err.into(),
    }
}

fn kind_label(kind: crate::cascade::EntityKind) -> &'static str {
    use crate::cascade::EntityKind::*;
    match kind {
        ProjectType => "Project type",
        CompanyProject => "Project",
        ProjectFeature => "Project feature",
        FeatureImage => "Project feature image",
        Blog => "Blog",
        BlogImage => "Blog image",
        Company => "Company",
        CompanySocialMedia => "Social media link",
        CompanyContact => "Company contact",
    }
}

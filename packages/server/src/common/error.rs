use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// API errors for the tuition marketplace.
///
/// Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl maps
/// each variant to a status code and a `{"error": "..."}` JSON body.
///
/// `NotFound` deliberately covers both "does not exist" and "not yours":
/// ownership-scoped mutations are compound-matched on `(id, owner_id)`, and a
/// miss on either condition must be indistinguishable to the caller.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Payment has not been completed")]
    PaymentNotCompleted,

    #[error("Checkout session metadata is missing {0}")]
    MetadataMissing(&'static str),

    #[error("Server misconfiguration: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::PaymentNotCompleted => StatusCode::PAYMENT_REQUIRED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidStatus(_) | ApiError::MetadataMissing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Configuration(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store, provider and configuration failures are logged server-side
        // and surfaced to the client as an opaque 500.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// True when the error is a Postgres unique-constraint violation (23505).
/// Used to turn duplicate inserts into `Conflict` instead of a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

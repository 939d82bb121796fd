use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::payments::{self, PaymentRecord, SettlementOutcome};
use crate::domains::users::Role;
use crate::server::app::AppState;
use crate::server::middleware::{require_auth, AuthState};

#[derive(Deserialize)]
pub struct CreateCheckoutRequest {
    pub tuition_id: Uuid,
    pub application_id: Uuid,
}

#[derive(Deserialize)]
pub struct PaymentCallbackRequest {
    pub session_id: Option<String>,
}

/// `POST /checkout-sessions` - build a provider checkout session for a
/// selected application and hand back the redirect URL. No local mutation.
pub async fn create_checkout_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<CreateCheckoutRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = payments::create_checkout(
        body.tuition_id,
        body.application_id,
        &state.checkout_success_url,
        &state.checkout_cancel_url,
        &state.deps,
        &state.db_pool,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "session_id": session.id, "url": session.url })),
    ))
}

/// `PATCH /payment-callback` - provider-sourced settlement trigger. Safe to
/// deliver more than once.
pub async fn payment_callback_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<PaymentCallbackRequest>,
) -> Result<Json<SettlementOutcome>, ApiError> {
    let session_id = body
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))?;

    let outcome = payments::finalize(&session_id, &state.deps, &state.db_pool).await?;

    Ok(Json(outcome))
}

/// `GET /payments` - students see what they paid, tutors what they earned,
/// admins everything.
pub async fn list_payments_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<PaymentRecord>>, ApiError> {
    let caller = require_auth(&auth)?;

    let records = match caller.role {
        Role::Student => PaymentRecord::find_by_student(caller.user_id, &state.db_pool).await?,
        Role::Teacher => PaymentRecord::find_by_tutor(caller.user_id, &state.db_pool).await?,
        Role::Admin => PaymentRecord::find_all(&state.db_pool).await?,
    };

    Ok(Json(records))
}

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::common::ApiError;
use crate::domains::users::{NewUser, Role, User};
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct TokenRequest {
    pub id_token: Option<String>,
}

/// `POST /signup` - create an account. Registration precedes login; the
/// session endpoint refuses identities without a profile.
pub async fn signup_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if body.firebase_uid.trim().is_empty() || body.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "firebase_uid and email are required".to_string(),
        ));
    }
    if body.role == Some(Role::Admin) {
        return Err(ApiError::BadRequest(
            "cannot sign up as admin".to_string(),
        ));
    }

    let user = User::insert(&body, &state.db_pool).await?;
    info!(user_id = %user.id, role = user.role.as_str(), "user signed up");

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /auth/token` - exchange an identity-provider credential for a
/// short-lived session token carrying `(user_id, role)`.
pub async fn token_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<Value>, ApiError> {
    let id_token = body
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("id_token is required".to_string()))?;

    let identity = state
        .deps
        .verifier
        .verify_id_token(&id_token)
        .await
        .map_err(|e| {
            warn!(error = %e, "identity verification failed");
            ApiError::Unauthorized
        })?;

    // Registration must precede login.
    let user = User::find_by_firebase_uid(&identity.uid, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let token = state
        .jwt_service
        .create_token(user.id, user.role)
        .map_err(|e| ApiError::Configuration(format!("failed to sign session token: {}", e)))?;

    Ok(Json(json!({ "token": token, "user": user })))
}

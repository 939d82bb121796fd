use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::auth::JwtService;
use crate::domains::users::Role;

/// Authenticated user information from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Outcome of token extraction, stored in request extensions.
///
/// A missing credential and a bad credential are different failures
/// downstream: no token is `Unauthorized`, a malformed or expired one is
/// `Forbidden`. The middleware never blocks; handlers decide via the guards.
#[derive(Clone, Debug)]
pub enum AuthState {
    Anonymous,
    Invalid,
    Authenticated(AuthUser),
}

/// JWT authentication middleware
///
/// Extracts the session token from the Authorization header, verifies it,
/// and adds an AuthState to request extensions. Requests always continue;
/// public endpoints simply ignore the extension.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_state = extract_auth_state(&request, &jwt_service);

    if let AuthState::Authenticated(user) = &auth_state {
        debug!("Authenticated user: {} ({})", user.user_id, user.role.as_str());
    }
    request.extensions_mut().insert(auth_state);

    next.run(request).await
}

/// Extract and verify the session token from a request
fn extract_auth_state(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> AuthState {
    // Get Authorization header
    let Some(auth_header) = request.headers().get("authorization") else {
        return AuthState::Anonymous;
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return AuthState::Invalid;
    };

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    // Verify token
    match jwt_service.verify_token(token) {
        Ok(claims) => AuthState::Authenticated(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
        }),
        Err(_) => AuthState::Invalid,
    }
}

/// Require a valid session: no credential is 401, a bad one is 403.
pub fn require_auth(auth: &AuthState) -> Result<&AuthUser, ApiError> {
    match auth {
        AuthState::Authenticated(user) => Ok(user),
        AuthState::Anonymous => Err(ApiError::Unauthorized),
        AuthState::Invalid => Err(ApiError::Forbidden(
            "invalid or expired token".to_string(),
        )),
    }
}

/// Require a valid session with a specific role.
pub fn require_role(auth: &AuthState, role: Role) -> Result<&AuthUser, ApiError> {
    let user = require_auth(auth)?;
    if user.role != role {
        return Err(ApiError::Forbidden(format!(
            "{} access required",
            role.as_str()
        )));
    }
    Ok(user)
}

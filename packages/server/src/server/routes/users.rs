use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::users::{AdminUpdateUser, PublicTutor, Role, UpdateProfile, User};
use crate::server::app::AppState;
use crate::server::middleware::{require_auth, require_role, AuthState};

/// `GET /users/me`
pub async fn me_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<User>, ApiError> {
    let caller = require_auth(&auth)?;

    let user = User::find_by_id(caller.user_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user))
}

/// `PATCH /users/me` - profile fields only; role is admin territory.
pub async fn update_me_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<User>, ApiError> {
    let caller = require_auth(&auth)?;

    let user = User::update_profile(caller.user_id, &body, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user))
}

/// `DELETE /users/me`
pub async fn delete_me_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let caller = require_auth(&auth)?;

    if !User::delete(caller.user_id, &state.db_pool).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %caller.user_id, "user deleted own account");

    Ok(Json(json!({ "deleted": true })))
}

/// `GET /users` (admin)
pub async fn list_users_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&auth, Role::Admin)?;

    Ok(Json(User::find_all(&state.db_pool).await?))
}

/// `GET /tutors/public` - public tutor directory, contact details redacted.
pub async fn public_tutors_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<PublicTutor>>, ApiError> {
    Ok(Json(User::find_public_tutors(&state.db_pool).await?))
}

/// `PATCH /admin/users/:id` (admin) - may change role and profile fields.
pub async fn admin_update_user_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AdminUpdateUser>,
) -> Result<Json<User>, ApiError> {
    require_role(&auth, Role::Admin)?;

    let user = User::update_by_admin(id, &body, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user updated by admin");

    Ok(Json(user))
}

/// `DELETE /admin/users/:id` (admin)
pub async fn admin_delete_user_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&auth, Role::Admin)?;

    if !User::delete(id, &state.db_pool).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %id, "user deleted by admin");

    Ok(Json(json!({ "deleted": true })))
}

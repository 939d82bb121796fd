use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::tuitions::{
    ModerationStatus, NewTuition, PublicTuition, Tuition, UpdateTuition,
};
use crate::domains::users::Role;
use crate::server::app::AppState;
use crate::server::middleware::{require_auth, require_role, AuthState};

#[derive(Deserialize)]
pub struct ModerateRequest {
    pub post_status: Option<String>,
}

/// `POST /tuitions` (student) - new listing, `open` and awaiting moderation.
pub async fn create_tuition_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Json(body): Json<NewTuition>,
) -> Result<(StatusCode, Json<Tuition>), ApiError> {
    let caller = require_role(&auth, Role::Student)?;

    let tuition = Tuition::insert(caller.user_id, &body, &state.db_pool).await?;
    info!(tuition_id = %tuition.id, student_id = %caller.user_id, "tuition posted");

    Ok((StatusCode::CREATED, Json(tuition)))
}

/// `GET /tuitions` - students see their own listings, admins see all.
pub async fn list_tuitions_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Tuition>>, ApiError> {
    let caller = require_auth(&auth)?;

    let tuitions = match caller.role {
        Role::Student => Tuition::find_by_student(caller.user_id, &state.db_pool).await?,
        Role::Admin => Tuition::find_all(&state.db_pool).await?,
        Role::Teacher => {
            return Err(ApiError::Forbidden(
                "teachers browse listings via /tuitions/public".to_string(),
            ))
        }
    };

    Ok(Json(tuitions))
}

/// `GET /tuitions/public` - open listings, owner redacted. No auth.
pub async fn public_tuitions_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<PublicTuition>>, ApiError> {
    Ok(Json(Tuition::find_open_public(&state.db_pool).await?))
}

/// `GET /tuitions/:id/details` (teacher) - full listing, any post.
pub async fn tuition_details_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tuition>, ApiError> {
    require_role(&auth, Role::Teacher)?;

    let tuition = Tuition::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(tuition))
}

/// `PATCH /tuitions/:id` (student, owner) - descriptive fields, while open.
pub async fn update_tuition_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTuition>,
) -> Result<Json<Tuition>, ApiError> {
    let caller = require_role(&auth, Role::Student)?;

    // Compound match: absent and not-owned are the same 404.
    let tuition = Tuition::update_owned(id, caller.user_id, &body, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(tuition))
}

/// `PATCH /tuitions/:id/moderate` (admin) - approve or reject visibility.
pub async fn moderate_tuition_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ModerateRequest>,
) -> Result<Json<Tuition>, ApiError> {
    require_role(&auth, Role::Admin)?;

    let post_status = match body.post_status.as_deref() {
        Some("approved") => ModerationStatus::Approved,
        Some("rejected") => ModerationStatus::Rejected,
        Some(other) => return Err(ApiError::InvalidStatus(other.to_string())),
        None => return Err(ApiError::BadRequest("post_status is required".to_string())),
    };

    let tuition = Tuition::moderate(id, post_status, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(tuition_id = %tuition.id, post_status = ?post_status, "tuition moderated");

    Ok(Json(tuition))
}

/// `DELETE /tuitions/:id` (student, owner)
pub async fn delete_tuition_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let caller = require_role(&auth, Role::Student)?;

    if !Tuition::delete_owned(id, caller.user_id, &state.db_pool).await? {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({ "deleted": true })))
}

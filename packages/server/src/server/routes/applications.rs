use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::applications::{
    Application, ApplicationStatus, NewApplication, UpdateApplication,
};
use crate::domains::users::Role;
use crate::server::app::AppState;
use crate::server::middleware::{require_auth, require_role, AuthState};

/// Patch body shared by both personas: a teacher edits content fields, the
/// listing's student sets `apply_status`.
#[derive(Deserialize, Default)]
pub struct ApplicationPatch {
    pub apply_status: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub expected_salary: Option<i64>,
}

fn parse_status(value: &str) -> Result<ApplicationStatus, ApiError> {
    match value {
        "pending" => Ok(ApplicationStatus::Pending),
        "selected_pending_payment" => Ok(ApplicationStatus::SelectedPendingPayment),
        "selected" => Ok(ApplicationStatus::Selected),
        "rejected" => Ok(ApplicationStatus::Rejected),
        other => Err(ApiError::InvalidStatus(other.to_string())),
    }
}

/// `POST /applications` (teacher) - apply to a listing.
pub async fn create_application_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Json(body): Json<NewApplication>,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    let caller = require_role(&auth, Role::Teacher)?;

    let application = Application::insert(caller.user_id, &body, &state.db_pool).await?;
    info!(
        application_id = %application.id,
        tuition_id = %application.tuition_id,
        tutor_id = %caller.user_id,
        "application submitted"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

/// `GET /applications` - teachers see what they sent, students what they
/// received across their listings.
pub async fn list_applications_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let caller = require_auth(&auth)?;

    let applications = match caller.role {
        Role::Teacher => Application::find_by_tutor(caller.user_id, &state.db_pool).await?,
        Role::Student => Application::find_by_student(caller.user_id, &state.db_pool).await?,
        Role::Admin => {
            return Err(ApiError::Forbidden(
                "applications are scoped to their participants".to_string(),
            ))
        }
    };

    Ok(Json(applications))
}

/// `PATCH /applications/:id` - role decides the persona:
/// teacher (applicant): content fields, while pending;
/// student (listing owner): explicit `apply_status`, validated against the
/// transition table.
pub async fn update_application_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApplicationPatch>,
) -> Result<Json<Application>, ApiError> {
    let caller = require_auth(&auth)?;

    let application = match caller.role {
        Role::Teacher => {
            let update = UpdateApplication {
                qualification: body.qualification,
                experience: body.experience,
                expected_salary: body.expected_salary,
            };
            Application::update_owned(id, caller.user_id, &update, &state.db_pool)
                .await?
                .ok_or(ApiError::NotFound)?
        }
        Role::Student => {
            let next = body
                .apply_status
                .as_deref()
                .ok_or_else(|| ApiError::BadRequest("apply_status is required".to_string()))
                .and_then(parse_status)?;
            Application::set_status_by_student(id, caller.user_id, next, &state.db_pool).await?
        }
        Role::Admin => {
            return Err(ApiError::Forbidden(
                "applications are scoped to their participants".to_string(),
            ))
        }
    };

    Ok(Json(application))
}

/// `DELETE /applications/:id` (teacher, owner)
pub async fn delete_application_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let caller = require_role(&auth, Role::Teacher)?;

    if !Application::delete_owned(id, caller.user_id, &state.db_pool).await? {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({ "deleted": true })))
}

/// `PATCH /applications/:id/select` (student, listing owner) - choose one
/// pending application; competitors still pending are rejected in the same
/// transaction and the listing moves to `selected_pending_payment`.
pub async fn select_application_handler(
    Extension(auth): Extension<AuthState>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    let caller = require_role(&auth, Role::Student)?;

    let application = Application::select(id, caller.user_id, &state.db_pool).await?;

    Ok(Json(application))
}

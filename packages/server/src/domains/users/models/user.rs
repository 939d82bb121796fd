use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::is_unique_violation;
use crate::common::ApiError;

/// Account role. Stored as TEXT; never raw strings in the domain layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// User model - SQL persistence layer
///
/// Identity (credential verification) lives in Firebase; this row holds the
/// profile and role. `firebase_uid` is immutable after insert.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub firebase_uid: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted at signup.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub firebase_uid: String,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Admin edit: everything a self-edit allows, plus the role.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminUpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Public tutor directory entry. Contact details are redacted.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct PublicTutor {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
}

impl User {
    /// Insert a new user. Duplicate email or firebase_uid becomes `Conflict`.
    pub async fn insert(new_user: &NewUser, pool: &PgPool) -> Result<Self, ApiError> {
        let role = new_user.role.unwrap_or(Role::Student);

        sqlx::query_as::<_, Self>(
            "INSERT INTO users (firebase_uid, email, name, role, phone, location, bio)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&new_user.firebase_uid)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(role)
        .bind(&new_user.phone)
        .bind(&new_user.location)
        .bind(&new_user.bio)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("an account with this email already exists".to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn find_by_firebase_uid(uid: &str, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM users WHERE firebase_uid = $1")
                .bind(uid)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// All users, newest first. Admin only (enforced by the route).
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM users ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?,
        )
    }

    /// Public tutor directory: teachers only, contact details omitted.
    pub async fn find_public_tutors(pool: &PgPool) -> Result<Vec<PublicTutor>, ApiError> {
        Ok(sqlx::query_as::<_, PublicTutor>(
            "SELECT id, name, location, bio FROM users
             WHERE role = 'teacher'
             ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?)
    }

    /// Self-service profile update. Role and firebase_uid are not touchable.
    pub async fn update_profile(
        id: Uuid,
        update: &UpdateProfile,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 location = COALESCE($4, location),
                 bio = COALESCE($5, bio)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.location)
        .bind(&update.bio)
        .fetch_optional(pool)
        .await?)
    }

    pub async fn update_by_admin(
        id: Uuid,
        update: &AdminUpdateUser,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 role = COALESCE($3, role),
                 phone = COALESCE($4, phone),
                 location = COALESCE($5, location),
                 bio = COALESCE($6, bio)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(update.role)
        .bind(&update.phone)
        .bind(&update.location)
        .bind(&update.bio)
        .fetch_optional(pool)
        .await?)
    }

    /// Returns true when a row was deleted.
    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

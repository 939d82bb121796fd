use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::payments::PaymentState;

/// Market state of a listing.
///
/// `open -> selected_pending_payment -> selected`; `closed` takes a listing
/// off the market. Moderation is a separate axis (`ModerationStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Open,
    SelectedPendingPayment,
    Selected,
    Closed,
}

/// Admin moderation state, independent of the market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Tuition listing - SQL persistence layer
///
/// Invariant: `selected_application_id` is set only while `status` is
/// `selected_pending_payment` or `selected`. The selection transaction in
/// the applications domain is the only writer of those columns.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tuition {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub class_level: String,
    pub subject: String,
    pub location: String,
    pub budget: i64,
    pub salary: Option<i64>,
    pub status: ListingStatus,
    pub post_status: ModerationStatus,
    pub payment_status: Option<PaymentState>,
    pub selected_application_id: Option<Uuid>,
    pub selected_tutor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub selected_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Fields accepted when a student posts a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTuition {
    pub title: String,
    pub class_level: String,
    pub subject: String,
    pub location: String,
    pub budget: i64,
    pub salary: Option<i64>,
}

/// Descriptive fields a student may edit while the listing is open.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateTuition {
    pub title: Option<String>,
    pub class_level: Option<String>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub budget: Option<i64>,
    pub salary: Option<i64>,
}

/// Public market view of an open listing. The posting student's id is
/// redacted; teachers see it only through the authenticated detail endpoint.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct PublicTuition {
    pub id: Uuid,
    pub title: String,
    pub class_level: String,
    pub subject: String,
    pub location: String,
    pub budget: i64,
    pub salary: Option<i64>,
    pub post_status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

impl Tuition {
    /// Insert a new listing: `status=open`, `post_status=pending`.
    pub async fn insert(
        student_id: Uuid,
        new_tuition: &NewTuition,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "INSERT INTO tuitions (student_id, title, class_level, subject, location, budget, salary)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(student_id)
        .bind(&new_tuition.title)
        .bind(&new_tuition.class_level)
        .bind(&new_tuition.subject)
        .bind(&new_tuition.location)
        .bind(new_tuition.budget)
        .bind(new_tuition.salary)
        .fetch_one(pool)
        .await?)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM tuitions WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// Listings posted by one student, newest first.
    pub async fn find_by_student(student_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM tuitions WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?)
    }

    /// All listings, newest first. Admin only (enforced by the route).
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM tuitions ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?,
        )
    }

    /// Open listings for the public market view, owner redacted.
    pub async fn find_open_public(pool: &PgPool) -> Result<Vec<PublicTuition>, ApiError> {
        Ok(sqlx::query_as::<_, PublicTuition>(
            "SELECT id, title, class_level, subject, location, budget, salary, post_status, created_at
             FROM tuitions
             WHERE status = 'open'
             ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?)
    }

    /// Owner-scoped edit of descriptive fields, allowed only while open.
    ///
    /// The compound `(id, student_id, status)` match enforces existence,
    /// ownership and editability in one conditional update. A miss on any of
    /// them is a single indistinguishable `None`.
    pub async fn update_owned(
        id: Uuid,
        student_id: Uuid,
        update: &UpdateTuition,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "UPDATE tuitions
             SET title = COALESCE($3, title),
                 class_level = COALESCE($4, class_level),
                 subject = COALESCE($5, subject),
                 location = COALESCE($6, location),
                 budget = COALESCE($7, budget),
                 salary = COALESCE($8, salary)
             WHERE id = $1 AND student_id = $2 AND status = 'open'
             RETURNING *",
        )
        .bind(id)
        .bind(student_id)
        .bind(&update.title)
        .bind(&update.class_level)
        .bind(&update.subject)
        .bind(&update.location)
        .bind(update.budget)
        .bind(update.salary)
        .fetch_optional(pool)
        .await?)
    }

    /// Admin moderation: approve or reject a listing's visibility.
    pub async fn moderate(
        id: Uuid,
        post_status: ModerationStatus,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "UPDATE tuitions SET post_status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(post_status)
        .fetch_optional(pool)
        .await?)
    }

    /// Owner-scoped delete; same compound-match pattern as `update_owned`.
    pub async fn delete_owned(id: Uuid, student_id: Uuid, pool: &PgPool) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM tuitions WHERE id = $1 AND student_id = $2")
            .bind(id)
            .bind(student_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_status_serializes_snake_case() {
        let json = serde_json::to_string(&ListingStatus::SelectedPendingPayment).unwrap();
        assert_eq!(json, "\"selected_pending_payment\"");
    }

    #[test]
    fn moderation_status_round_trip() {
        let back: ModerationStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(back, ModerationStatus::Approved);
    }
}

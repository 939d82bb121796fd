use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::common::error::is_unique_violation;
use crate::common::ApiError;
use crate::domains::payments::PaymentState;
use crate::domains::tuitions::Tuition;

/// Application state machine.
///
/// `pending -> selected_pending_payment -> selected`
/// `pending -> rejected`
/// `selected_pending_payment -> rejected`
///
/// `selected` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    SelectedPendingPayment,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, SelectedPendingPayment)
                | (Pending, Rejected)
                | (SelectedPendingPayment, Selected)
                | (SelectedPendingPayment, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Selected | ApplicationStatus::Rejected)
    }
}

/// A teacher's application to a tuition listing - SQL persistence layer
///
/// `student_id` is copied from the listing at apply time so the owning
/// student can be authorized on status transitions without a join.
/// `subject`/`location`/`class_level` are a display snapshot of the listing,
/// filled in by the settlement engine when payment completes.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Application {
    pub id: Uuid,
    pub tuition_id: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub apply_status: ApplicationStatus,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub expected_salary: Option<i64>,
    pub payment_status: Option<PaymentState>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub class_level: Option<String>,
    pub created_at: DateTime<Utc>,
    pub selected_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Content fields a teacher submits when applying.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    pub tuition_id: Uuid,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub expected_salary: Option<i64>,
}

/// Content fields a teacher may edit while the application is pending.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateApplication {
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub expected_salary: Option<i64>,
}

impl Application {
    /// Apply to a listing.
    ///
    /// The `(tuition_id, tutor_id)` unique constraint is the idempotency
    /// guard against duplicate submissions; a violation becomes `Conflict`.
    pub async fn insert(
        tutor_id: Uuid,
        new_application: &NewApplication,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        let tuition = Tuition::find_by_id(new_application.tuition_id, pool)
            .await?
            .ok_or(ApiError::NotFound)?;

        sqlx::query_as::<_, Self>(
            "INSERT INTO applications (tuition_id, student_id, tutor_id, qualification, experience, expected_salary)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(tuition.id)
        .bind(tuition.student_id)
        .bind(tutor_id)
        .bind(&new_application.qualification)
        .bind(&new_application.experience)
        .bind(new_application.expected_salary)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("you have already applied to this tuition".to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// Applications submitted by one tutor, newest first.
    pub async fn find_by_tutor(tutor_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM applications WHERE tutor_id = $1 ORDER BY created_at DESC",
        )
        .bind(tutor_id)
        .fetch_all(pool)
        .await?)
    }

    /// Applications received across one student's listings, newest first.
    pub async fn find_by_student(student_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM applications WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?)
    }

    pub async fn find_by_tuition(tuition_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM applications WHERE tuition_id = $1 ORDER BY created_at DESC",
        )
        .bind(tuition_id)
        .fetch_all(pool)
        .await?)
    }

    /// Tutor-scoped edit of content fields, allowed only while pending.
    pub async fn update_owned(
        id: Uuid,
        tutor_id: Uuid,
        update: &UpdateApplication,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "UPDATE applications
             SET qualification = COALESCE($3, qualification),
                 experience = COALESCE($4, experience),
                 expected_salary = COALESCE($5, expected_salary)
             WHERE id = $1 AND tutor_id = $2 AND apply_status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(tutor_id)
        .bind(&update.qualification)
        .bind(&update.experience)
        .bind(update.expected_salary)
        .fetch_optional(pool)
        .await?)
    }

    /// Tutor-scoped delete.
    pub async fn delete_owned(id: Uuid, tutor_id: Uuid, pool: &PgPool) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND tutor_id = $2")
            .bind(id)
            .bind(tutor_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Explicit status set by the owning student, validated against the
    /// transition table. The compare-and-set on the current status keeps a
    /// concurrent transition from sneaking past the validation.
    pub async fn set_status_by_student(
        id: Uuid,
        student_id: Uuid,
        next: ApplicationStatus,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        let current = sqlx::query_as::<_, Self>(
            "SELECT * FROM applications WHERE id = $1 AND student_id = $2",
        )
        .bind(id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)?;

        if !current.apply_status.can_transition(next) {
            return Err(ApiError::InvalidStatus(format!(
                "cannot move an application from {:?} to {:?}",
                current.apply_status, next
            )));
        }

        sqlx::query_as::<_, Self>(
            "UPDATE applications
             SET apply_status = $3
             WHERE id = $1 AND student_id = $2 AND apply_status = $4
             RETURNING *",
        )
        .bind(id)
        .bind(student_id)
        .bind(next)
        .bind(current.apply_status)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("the application changed state while updating".to_string())
        })
    }

    /// Select this application for its listing. One transaction, three steps:
    ///
    /// 1. chosen application `pending -> selected_pending_payment`;
    /// 2. parent listing `open -> selected_pending_payment`, recording the
    ///    selected application and tutor (the `status = 'open'` precondition
    ///    is the compare-and-set that makes a concurrent duplicate select
    ///    lose cleanly);
    /// 3. every other still-pending application on the listing -> `rejected`
    ///    in one conditional batch update. Competitors already in
    ///    `selected_pending_payment` are intentionally left untouched.
    pub async fn select(
        id: Uuid,
        student_id: Uuid,
        pool: &PgPool,
    ) -> Result<Self, ApiError> {
        let mut tx = pool.begin().await?;

        let application = sqlx::query_as::<_, Self>(
            "UPDATE applications
             SET apply_status = 'selected_pending_payment', selected_at = NOW()
             WHERE id = $1 AND student_id = $2 AND apply_status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound)?;

        sqlx::query_as::<_, Tuition>(
            "UPDATE tuitions
             SET status = 'selected_pending_payment',
                 selected_application_id = $3,
                 selected_tutor_id = $4,
                 selected_at = NOW()
             WHERE id = $1 AND student_id = $2 AND status = 'open'
             RETURNING *",
        )
        .bind(application.tuition_id)
        .bind(student_id)
        .bind(application.id)
        .bind(application.tutor_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("a tutor has already been selected for this tuition".to_string())
        })?;

        let rejected = sqlx::query(
            "UPDATE applications
             SET apply_status = 'rejected'
             WHERE tuition_id = $1 AND id <> $2 AND apply_status = 'pending'",
        )
        .bind(application.tuition_id)
        .bind(application.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            application_id = %application.id,
            tuition_id = %application.tuition_id,
            tutor_id = %application.tutor_id,
            rejected = rejected.rows_affected(),
            "application selected, awaiting payment"
        );

        Ok(application)
    }
}

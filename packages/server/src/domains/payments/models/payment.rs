use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::ApiError;

/// Settlement state stamped onto listings, applications and payment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
}

/// Settlement record - SQL persistence layer
///
/// Append-only: one row per completed checkout session, keyed by
/// `stripe_session_id`. Never updated after the first insert.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub tuition_id: Uuid,
    pub application_id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub amount: i64,
    pub tutor_amount: i64,
    pub admin_fee: i64,
    pub status: PaymentState,
    pub stripe_session_id: String,
    pub paid_at: DateTime<Utc>,
}

/// Everything needed to write a settlement record.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub tuition_id: Uuid,
    pub application_id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub amount: i64,
    pub tutor_amount: i64,
    pub admin_fee: i64,
    pub stripe_session_id: String,
}

impl PaymentRecord {
    /// Insert-if-absent keyed by the checkout session id.
    ///
    /// Returns `true` when a row was inserted, `false` when the session was
    /// already settled. A retried payment callback therefore cannot
    /// double-count revenue.
    pub async fn insert_if_absent(
        record: &NewPaymentRecord,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "INSERT INTO payments (tuition_id, application_id, tutor_id, student_id,
                                   amount, tutor_amount, admin_fee, status, stripe_session_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'paid', $8)
             ON CONFLICT (stripe_session_id) DO NOTHING",
        )
        .bind(record.tuition_id)
        .bind(record.application_id)
        .bind(record.tutor_id)
        .bind(record.student_id)
        .bind(record.amount)
        .bind(record.tutor_amount)
        .bind(record.admin_fee)
        .bind(&record.stripe_session_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_session_id(
        session_id: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM payments WHERE stripe_session_id = $1")
                .bind(session_id)
                .fetch_optional(pool)
                .await?,
        )
    }

    /// Payments made by one student, newest first.
    pub async fn find_by_student(student_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM payments WHERE student_id = $1 ORDER BY paid_at DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?)
    }

    /// Payments received by one tutor, newest first.
    pub async fn find_by_tutor(tutor_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(sqlx::query_as::<_, Self>(
            "SELECT * FROM payments WHERE tutor_id = $1 ORDER BY paid_at DESC",
        )
        .bind(tutor_id)
        .fetch_all(pool)
        .await?)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>, ApiError> {
        Ok(
            sqlx::query_as::<_, Self>("SELECT * FROM payments ORDER BY paid_at DESC")
                .fetch_all(pool)
                .await?,
        )
    }
}

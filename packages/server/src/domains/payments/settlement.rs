//! Settlement engine: turns a completed checkout session into final state on
//! the listing, the winning application and the payments ledger.
//!
//! The provider may deliver the payment callback more than once. Settlement
//! is therefore idempotent end to end: the ledger insert is keyed by session
//! id (insert-if-absent) and the listing/application updates are absolute
//! sets, so one or two deliveries converge to identical state.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::applications::Application;
use crate::domains::tuitions::Tuition;
use crate::domains::users::User;
use crate::kernel::{CheckoutRequest, CheckoutSession, ServerDeps};

use super::models::payment::{NewPaymentRecord, PaymentRecord};

/// Platform cut of the first-month salary, in percent.
pub const ADMIN_FEE_PERCENT: i64 = 10;

const CURRENCY: &str = "usd";

// Metadata keys carried through the checkout session. The ids are required
// at settlement; the rest is context for receipts and the ledger.
const META_TUITION_ID: &str = "tuition_id";
const META_APPLICATION_ID: &str = "application_id";
const META_TUTOR_ID: &str = "tutor_id";
const META_STUDENT_ID: &str = "student_id";
const META_SALARY: &str = "salary";
const META_TUTOR_AMOUNT: &str = "tutor_amount";
const META_ADMIN_FEE: &str = "admin_fee";

/// Split an amount into `(tutor_amount, admin_fee)`.
pub fn fee_split(amount: i64) -> (i64, i64) {
    let admin_fee = amount * ADMIN_FEE_PERCENT / 100;
    (amount - admin_fee, admin_fee)
}

/// What a settled (or re-delivered) callback reports back.
#[derive(Debug, Serialize)]
pub struct SettlementOutcome {
    pub tuition_id: Uuid,
    pub application_id: Uuid,
    /// False when this callback was a duplicate of an already-settled session.
    pub payment_recorded: bool,
}

/// Build a provider checkout session for a selected application.
///
/// Carries the full settlement context as opaque metadata and returns the
/// redirect URL. Mutates no local state.
pub async fn create_checkout(
    tuition_id: Uuid,
    application_id: Uuid,
    success_url: &str,
    cancel_url: &str,
    deps: &ServerDeps,
    pool: &PgPool,
) -> Result<CheckoutSession, ApiError> {
    let tuition = Tuition::find_by_id(tuition_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    let application = Application::find_by_id(application_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    if application.tuition_id != tuition.id {
        return Err(ApiError::BadRequest(
            "application does not belong to this tuition".to_string(),
        ));
    }

    let salary = tuition.salary.ok_or_else(|| {
        ApiError::BadRequest("tuition has no salary to collect".to_string())
    })?;
    let (tutor_amount, admin_fee) = fee_split(salary);

    let tutor = User::find_by_id(application.tutor_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    let student = User::find_by_id(tuition.student_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut metadata = HashMap::new();
    metadata.insert(META_TUITION_ID.to_string(), tuition.id.to_string());
    metadata.insert(META_APPLICATION_ID.to_string(), application.id.to_string());
    metadata.insert(META_TUTOR_ID.to_string(), tutor.id.to_string());
    metadata.insert(META_STUDENT_ID.to_string(), student.id.to_string());
    metadata.insert(META_SALARY.to_string(), salary.to_string());
    metadata.insert(META_TUTOR_AMOUNT.to_string(), tutor_amount.to_string());
    metadata.insert(META_ADMIN_FEE.to_string(), admin_fee.to_string());
    metadata.insert("title".to_string(), tuition.title.clone());
    metadata.insert("tutor_name".to_string(), tutor.name.clone());
    metadata.insert("tutor_email".to_string(), tutor.email.clone());

    let session = deps
        .payments
        .create_checkout_session(CheckoutRequest {
            product_name: format!("Tuition: {}", tuition.title),
            // Salary is stored in whole currency units; the provider wants
            // the smallest unit.
            unit_amount: salary * 100,
            currency: CURRENCY.to_string(),
            customer_email: Some(student.email.clone()),
            metadata,
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
        })
        .await?;

    info!(
        session_id = %session.id,
        tuition_id = %tuition.id,
        application_id = %application.id,
        amount = salary,
        "checkout session created"
    );

    Ok(session)
}

/// Reconcile a payment callback into final state.
///
/// Retrieves the session from the provider; anything other than `paid`
/// mutates nothing. On `paid`, one transaction: ledger insert-if-absent,
/// application to `selected`/`paid` with the listing's display snapshot
/// copied on, listing to `selected`/`paid`.
pub async fn finalize(
    session_id: &str,
    deps: &ServerDeps,
    pool: &PgPool,
) -> Result<SettlementOutcome, ApiError> {
    let session = deps.payments.retrieve_session(session_id).await?;

    if !session.is_paid() {
        return Err(ApiError::PaymentNotCompleted);
    }

    let tuition_id = parse_uuid(&session.metadata, META_TUITION_ID)
        .ok_or(ApiError::MetadataMissing(META_TUITION_ID))?;
    let application_id = parse_uuid(&session.metadata, META_APPLICATION_ID)
        .ok_or(ApiError::MetadataMissing(META_APPLICATION_ID))?;

    let mut tx = pool.begin().await?;

    let tuition = sqlx::query_as::<_, Tuition>("SELECT * FROM tuitions WHERE id = $1")
        .bind(tuition_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound)?;
    let application = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound)?;

    let amount = parse_i64(&session.metadata, META_SALARY)
        .or(tuition.salary)
        .ok_or_else(|| ApiError::BadRequest("settlement amount unknown".to_string()))?;
    let (default_tutor_amount, default_admin_fee) = fee_split(amount);
    let tutor_amount =
        parse_i64(&session.metadata, META_TUTOR_AMOUNT).unwrap_or(default_tutor_amount);
    let admin_fee = parse_i64(&session.metadata, META_ADMIN_FEE).unwrap_or(default_admin_fee);

    let payment_recorded = PaymentRecord::insert_if_absent(
        &NewPaymentRecord {
            tuition_id,
            application_id,
            tutor_id: application.tutor_id,
            student_id: application.student_id,
            amount,
            tutor_amount,
            admin_fee,
            stripe_session_id: session.id.clone(),
        },
        &mut tx,
    )
    .await?;

    // Absolute sets: re-applying on a duplicate delivery is a no-op. The
    // display snapshot comes from the listing as it stands now.
    sqlx::query(
        "UPDATE applications
         SET apply_status = 'selected',
             payment_status = 'paid',
             paid_at = COALESCE(paid_at, NOW()),
             subject = $2,
             location = $3,
             class_level = $4
         WHERE id = $1",
    )
    .bind(application_id)
    .bind(&tuition.subject)
    .bind(&tuition.location)
    .bind(&tuition.class_level)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE tuitions
         SET status = 'selected',
             payment_status = 'paid',
             paid_at = COALESCE(paid_at, NOW())
         WHERE id = $1",
    )
    .bind(tuition_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        session_id = %session.id,
        tuition_id = %tuition_id,
        application_id = %application_id,
        amount,
        payment_recorded,
        "payment settled"
    );

    Ok(SettlementOutcome {
        tuition_id,
        application_id,
        payment_recorded,
    })
}

fn parse_uuid(metadata: &HashMap<String, String>, key: &str) -> Option<Uuid> {
    metadata.get(key).and_then(|v| Uuid::parse_str(v).ok())
}

fn parse_i64(metadata: &HashMap<String, String>, key: &str) -> Option<i64> {
    metadata.get(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_split_takes_the_platform_cut() {
        let (tutor_amount, admin_fee) = fee_split(5000);
        assert_eq!(admin_fee, 500);
        assert_eq!(tutor_amount, 4500);
        assert_eq!(tutor_amount + admin_fee, 5000);
    }

    #[test]
    fn fee_split_rounds_toward_the_tutor() {
        let (tutor_amount, admin_fee) = fee_split(99);
        assert_eq!(admin_fee, 9);
        assert_eq!(tutor_amount, 90);
    }

    #[test]
    fn parse_uuid_rejects_garbage() {
        let mut metadata = HashMap::new();
        metadata.insert("tuition_id".to_string(), "not-a-uuid".to_string());
        assert!(parse_uuid(&metadata, "tuition_id").is_none());
        assert!(parse_uuid(&metadata, "absent").is_none());
    }
}

//! Server dependencies (using traits for testability)
//!
//! The central dependency container handed to route handlers. External
//! services sit behind trait abstractions so tests can inject mocks; the
//! container is built once at startup and passed by reference - no lazily
//! initialized globals.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use firebase::FirebaseService;
use stripe::models::CreateCheckoutSession;
use stripe::StripeService;

use super::{
    BaseIdentityVerifier, BasePaymentProvider, CheckoutRequest, CheckoutSession,
    CheckoutSessionStatus, VerifiedIdentity,
};

// =============================================================================
// FirebaseService Adapter (implements BaseIdentityVerifier trait)
// =============================================================================

/// Wrapper around FirebaseService that implements BaseIdentityVerifier
pub struct FirebaseAdapter(pub Arc<FirebaseService>);

impl FirebaseAdapter {
    pub fn new(service: Arc<FirebaseService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseIdentityVerifier for FirebaseAdapter {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity> {
        let account = self
            .0
            .verify_id_token(id_token)
            .await
            .map_err(|e| anyhow!(e))?;

        Ok(VerifiedIdentity {
            uid: account.local_id,
            email: account.email,
        })
    }
}

// =============================================================================
// StripeService Adapter (implements BasePaymentProvider trait)
// =============================================================================

/// Wrapper around StripeService that implements BasePaymentProvider
pub struct StripeAdapter(pub Arc<StripeService>);

impl StripeAdapter {
    pub fn new(service: Arc<StripeService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BasePaymentProvider for StripeAdapter {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let session = self
            .0
            .create_checkout_session(&CreateCheckoutSession {
                product_name: request.product_name,
                unit_amount: request.unit_amount,
                currency: request.currency,
                quantity: 1,
                customer_email: request.customer_email,
                metadata: request.metadata,
                success_url: request.success_url,
                cancel_url: request.cancel_url,
            })
            .await
            .map_err(|e| anyhow!(e))?;

        let url = session
            .url
            .ok_or_else(|| anyhow!("Stripe returned a session without a redirect URL"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSessionStatus> {
        let session = self
            .0
            .retrieve_session(session_id)
            .await
            .map_err(|e| anyhow!(e))?;

        Ok(CheckoutSessionStatus {
            id: session.id,
            payment_status: session.payment_status.unwrap_or_else(|| "unpaid".to_string()),
            metadata: session.metadata,
        })
    }
}

// =============================================================================
// ServerDeps - dependency container
// =============================================================================

/// All external-service dependencies used by the route handlers.
pub struct ServerDeps {
    pub verifier: Arc<dyn BaseIdentityVerifier>,
    pub payments: Arc<dyn BasePaymentProvider>,
}

impl ServerDeps {
    pub fn new(
        verifier: Arc<dyn BaseIdentityVerifier>,
        payments: Arc<dyn BasePaymentProvider>,
    ) -> Self {
        Self { verifier, payments }
    }
}

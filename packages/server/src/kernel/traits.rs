// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. The settlement
// engine and the session issuer are domain code that consume them.
//
// Naming convention: Base* for trait names (e.g., BasePaymentProvider)

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Identity Verifier Trait (Infrastructure - external identity provider)
// =============================================================================

/// A credential verified by the external identity provider.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Stable external user id (Firebase `localId`).
    pub uid: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait BaseIdentityVerifier: Send + Sync {
    /// Verify an identity-provider credential and resolve it to a stable
    /// external user id. Rejection surfaces as an error.
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity>;
}

// =============================================================================
// Payment Provider Trait (Infrastructure - external checkout/settlement)
// =============================================================================

/// Parameters for a hosted checkout session with a single line item.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub product_name: String,
    /// Amount in the smallest currency unit.
    pub unit_amount: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    /// Opaque settlement context, echoed back on retrieval.
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A freshly created checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    /// Redirect URL for the hosted checkout page.
    pub url: String,
}

/// A checkout session as seen at settlement time.
#[derive(Debug, Clone)]
pub struct CheckoutSessionStatus {
    pub id: String,
    /// Provider-reported status: `paid`, `unpaid`, ...
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionStatus {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

#[async_trait]
pub trait BasePaymentProvider: Send + Sync {
    /// Create a checkout session; no local state is touched.
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;

    /// Retrieve a session's terminal status for settlement.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSessionStatus>;
}

// TestDependencies - mock implementations for testing
//
// Provides mock identity and payment services that can be injected into
// ServerDeps for tests. Each mock captures its calls and returns scripted
// responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{
    BaseIdentityVerifier, BasePaymentProvider, CheckoutRequest, CheckoutSession,
    CheckoutSessionStatus, VerifiedIdentity,
};

// =============================================================================
// Mock Identity Verifier
// =============================================================================

/// Verifies only the tokens it was primed with; everything else is rejected.
pub struct MockIdentityVerifier {
    identities: Arc<Mutex<HashMap<String, VerifiedIdentity>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self {
            identities: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prime the verifier to accept `token` and resolve it to `uid`.
    pub fn with_identity(self, token: &str, uid: &str) -> Self {
        self.identities.lock().unwrap().insert(
            token.to_string(),
            VerifiedIdentity {
                uid: uid.to_string(),
                email: None,
            },
        );
        self
    }

    /// Prime an already-shared verifier (used by integration tests that hold
    /// the mock behind an `Arc`).
    pub fn add_identity(&self, token: &str, uid: &str) {
        self.identities.lock().unwrap().insert(
            token.to_string(),
            VerifiedIdentity {
                uid: uid.to_string(),
                email: None,
            },
        );
    }

    /// Tokens passed to `verify_id_token`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockIdentityVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityVerifier for MockIdentityVerifier {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity> {
        self.calls.lock().unwrap().push(id_token.to_string());
        self.identities
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or_else(|| anyhow!("identity provider rejected the credential"))
    }
}

// =============================================================================
// Mock Payment Provider
// =============================================================================

/// In-memory checkout sessions: created sessions start `unpaid` and keep the
/// request metadata; tests flip them to `paid` before firing the callback.
pub struct MockPaymentProvider {
    sessions: Arc<Mutex<HashMap<String, CheckoutSessionStatus>>>,
    created: Arc<Mutex<Vec<CheckoutRequest>>>,
    fail_retrieve: Arc<Mutex<bool>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            created: Arc::new(Mutex::new(Vec::new())),
            fail_retrieve: Arc::new(Mutex::new(false)),
        }
    }

    /// Seed a session directly, bypassing creation.
    pub fn with_session(
        self,
        id: &str,
        payment_status: &str,
        metadata: HashMap<String, String>,
    ) -> Self {
        self.seed_session(id, payment_status, metadata);
        self
    }

    /// Seed a session on an already-shared provider (used by integration
    /// tests that hold the mock behind an `Arc`).
    pub fn seed_session(&self, id: &str, payment_status: &str, metadata: HashMap<String, String>) {
        self.sessions.lock().unwrap().insert(
            id.to_string(),
            CheckoutSessionStatus {
                id: id.to_string(),
                payment_status: payment_status.to_string(),
                metadata,
            },
        );
    }

    /// Mark an existing session as paid (simulates checkout completion).
    pub fn mark_paid(&self, session_id: &str) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(session_id) {
            session.payment_status = "paid".to_string();
        }
    }

    /// Make `retrieve_session` fail (simulates a provider outage).
    pub fn fail_next_retrieve(&self) {
        *self.fail_retrieve.lock().unwrap() = true;
    }

    /// Requests passed to `create_checkout_session`, in call order.
    pub fn created_requests(&self) -> Vec<CheckoutRequest> {
        self.created.lock().unwrap().clone()
    }
}

impl Default for MockPaymentProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut created = self.created.lock().unwrap();
        let id = format!("cs_test_{}", created.len() + 1);
        created.push(request.clone());

        self.sessions.lock().unwrap().insert(
            id.clone(),
            CheckoutSessionStatus {
                id: id.clone(),
                payment_status: "unpaid".to_string(),
                metadata: request.metadata,
            },
        );

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/{}", id),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSessionStatus> {
        let mut fail = self.fail_retrieve.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(anyhow!("payment provider unavailable"));
        }

        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| anyhow!("no such checkout session: {}", session_id))
    }
}

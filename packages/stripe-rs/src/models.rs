use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A Checkout Session as returned by the Stripe API.
///
/// Only the fields this service reads are modeled; everything else in the
/// response is ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Redirect URL for the hosted checkout page. Present on freshly created
    /// sessions, absent once the session has completed or expired.
    pub url: Option<String>,
    /// `unpaid`, `paid` or `no_payment_required`.
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Parameters for creating a Checkout Session with a single line item.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSession {
    pub product_name: String,
    /// Amount in the smallest currency unit.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: i64,
    pub customer_email: Option<String>,
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

// https://docs.stripe.com/api/checkout/sessions

use std::collections::HashMap;

pub mod models;

use reqwest::Client;

use crate::models::{CheckoutSession, CreateCheckoutSession};

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone)]
pub struct StripeOptions {
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct StripeService {
    options: StripeOptions,
}

impl StripeService {
    pub fn new(options: StripeOptions) -> Self {
        Self { options }
    }

    /// Create a hosted Checkout Session for a single line item.
    ///
    /// Stripe's form encoding uses bracketed keys for nested structures, so
    /// the line item and metadata are flattened into `line_items[0][...]` and
    /// `metadata[...]` pairs.
    pub async fn create_checkout_session(
        &self,
        params: &CreateCheckoutSession,
    ) -> Result<CheckoutSession, &'static str> {
        let url = format!("{}/checkout/sessions", API_BASE);

        let mut form: HashMap<String, String> = HashMap::new();
        form.insert("mode".into(), "payment".into());
        form.insert("success_url".into(), params.success_url.clone());
        form.insert("cancel_url".into(), params.cancel_url.clone());
        form.insert(
            "line_items[0][price_data][currency]".into(),
            params.currency.clone(),
        );
        form.insert(
            "line_items[0][price_data][product_data][name]".into(),
            params.product_name.clone(),
        );
        form.insert(
            "line_items[0][price_data][unit_amount]".into(),
            params.unit_amount.to_string(),
        );
        form.insert(
            "line_items[0][quantity]".into(),
            params.quantity.to_string(),
        );
        if let Some(email) = &params.customer_email {
            form.insert("customer_email".into(), email.clone());
        }
        for (key, value) in &params.metadata {
            form.insert(format!("metadata[{}]", key), value.clone());
        }

        let client = Client::new();
        let res = client
            .post(url)
            .basic_auth(&self.options.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Stripe error ({}): {}", status, error_body);
                    return Err("Stripe returned an error");
                }

                match response.json::<CheckoutSession>().await {
                    Ok(session) => Ok(session),
                    Err(e) => {
                        eprintln!("Failed to parse Stripe response: {}", e);
                        Err("Error parsing checkout session response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Stripe failed: {}", e);
                Err("Error creating checkout session")
            }
        }
    }

    /// Retrieve an existing Checkout Session by id.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, &'static str> {
        let url = format!("{}/checkout/sessions/{}", API_BASE, session_id);

        let client = Client::new();
        let res = client
            .get(url)
            .basic_auth(&self.options.secret_key, None::<&str>)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Stripe error ({}): {}", status, error_body);
                    return Err("Stripe returned an error");
                }

                match response.json::<CheckoutSession>().await {
                    Ok(session) => Ok(session),
                    Err(e) => {
                        eprintln!("Failed to parse Stripe response: {}", e);
                        Err("Error parsing checkout session response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Stripe failed: {}", e);
                Err("Error retrieving checkout session")
            }
        }
    }
}

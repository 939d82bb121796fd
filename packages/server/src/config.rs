use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub firebase_api_key: String,
    pub stripe_secret_key: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing secrets fail here, before the server accepts any request.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "tuition-api".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .context("FIREBASE_API_KEY must be set")?,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .context("STRIPE_SECRET_KEY must be set")?,
            checkout_success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/success".to_string()),
            checkout_cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/cancel".to_string()),
        })
    }
}

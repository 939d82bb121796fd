// Main entry point for the tuition marketplace API server

use std::sync::Arc;

use anyhow::{Context, Result};
use firebase::{FirebaseOptions, FirebaseService};
use server_core::config::Config;
use server_core::domains::auth::JwtService;
use server_core::kernel::{FirebaseAdapter, ServerDeps, StripeAdapter};
use server_core::server::build_app;
use sqlx::postgres::PgPoolOptions;
use stripe::{StripeOptions, StripeService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tuition Marketplace API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External services, constructed once and injected
    let firebase = Arc::new(FirebaseService::new(FirebaseOptions {
        api_key: config.firebase_api_key.clone(),
    }));
    let stripe = Arc::new(StripeService::new(StripeOptions {
        secret_key: config.stripe_secret_key.clone(),
    }));
    let deps = Arc::new(ServerDeps::new(
        Arc::new(FirebaseAdapter::new(firebase)),
        Arc::new(StripeAdapter::new(stripe)),
    ));
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
    ));

    // Build application
    let app = build_app(
        pool,
        deps,
        jwt_service,
        config.checkout_success_url.clone(),
        config.checkout_cancel_url.clone(),
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

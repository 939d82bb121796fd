//! Test harness with testcontainers for integration testing.
//!
//! The Postgres container and migrations are initialized once on the first
//! test and shared by the whole run; each test builds its own app with its
//! own mock external services on top of the shared database.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use server_core::domains::auth::JwtService;
use server_core::domains::users::{Role, User};
use server_core::kernel::{MockIdentityVerifier, MockPaymentProvider, ServerDeps};
use server_core::server::build_app;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG when running tests with --nocapture.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        // Run migrations once on the shared database
        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test harness: shared database, fresh app and fresh mocks.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub app: Router,
    pub jwt_service: Arc<JwtService>,
    pub verifier: Arc<MockIdentityVerifier>,
    pub payments: Arc<MockPaymentProvider>,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to shared test database")?;

        let verifier = Arc::new(MockIdentityVerifier::new());
        let payments = Arc::new(MockPaymentProvider::new());
        let deps = Arc::new(ServerDeps::new(verifier.clone(), payments.clone()));
        let jwt_service = Arc::new(JwtService::new("test_secret", "test_issuer".to_string()));

        let app = build_app(
            db_pool.clone(),
            deps,
            jwt_service.clone(),
            "https://app.test/payment/success".to_string(),
            "https://app.test/payment/cancel".to_string(),
        );

        Ok(Self {
            db_pool,
            app,
            jwt_service,
            verifier,
            payments,
        })
    }

    /// Session token for a user, signed with the test secret.
    pub fn token_for(&self, user: &User) -> String {
        self.jwt_service
            .create_token(user.id, user.role)
            .expect("Failed to create test token")
    }

    /// Session token for an id/role pair that has no user row.
    pub fn token_for_raw(&self, user_id: uuid::Uuid, role: Role) -> String {
        self.jwt_service
            .create_token(user_id, role)
            .expect("Failed to create test token")
    }
}

//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    admin_delete_user_handler, admin_update_user_handler, create_application_handler,
    create_checkout_handler, create_tuition_handler, delete_application_handler,
    delete_me_handler, delete_tuition_handler, health_handler, list_applications_handler,
    list_payments_handler, list_tuitions_handler, list_users_handler, me_handler,
    moderate_tuition_handler, payment_callback_handler, public_tuitions_handler,
    public_tutors_handler, select_application_handler, signup_handler, token_handler,
    tuition_details_handler, update_application_handler, update_me_handler,
    update_tuition_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
}

/// Build the Axum application router
///
/// Every dependency is constructed at startup and injected here; handlers
/// reach them through the `AppState` extension. The auth middleware only
/// extracts the session - authorization happens in the handlers.
pub fn build_app(
    pool: PgPool,
    deps: Arc<ServerDeps>,
    jwt_service: Arc<JwtService>,
    checkout_success_url: String,
    checkout_cancel_url: String,
) -> Router {
    let state = AppState {
        db_pool: pool,
        deps,
        jwt_service: jwt_service.clone(),
        checkout_success_url,
        checkout_cancel_url,
    };

    Router::new()
        .route("/health", get(health_handler))
        // Accounts and sessions
        .route("/signup", post(signup_handler))
        .route("/auth/token", post(token_handler))
        .route(
            "/users/me",
            get(me_handler)
                .patch(update_me_handler)
                .delete(delete_me_handler),
        )
        .route("/users", get(list_users_handler))
        .route("/tutors/public", get(public_tutors_handler))
        .route(
            "/admin/users/:id",
            patch(admin_update_user_handler).delete(admin_delete_user_handler),
        )
        // Listings
        .route(
            "/tuitions",
            post(create_tuition_handler).get(list_tuitions_handler),
        )
        .route("/tuitions/public", get(public_tuitions_handler))
        .route(
            "/tuitions/:id",
            patch(update_tuition_handler).delete(delete_tuition_handler),
        )
        .route("/tuitions/:id/details", get(tuition_details_handler))
        .route("/tuitions/:id/moderate", patch(moderate_tuition_handler))
        // Applications
        .route(
            "/applications",
            post(create_application_handler).get(list_applications_handler),
        )
        .route(
            "/applications/:id",
            patch(update_application_handler).delete(delete_application_handler),
        )
        .route(
            "/applications/:id/select",
            patch(select_application_handler),
        )
        // Settlement
        .route("/checkout-sessions", post(create_checkout_handler))
        .route("/payment-callback", patch(payment_callback_handler))
        .route("/payments", get(list_payments_handler))
        .layer(middleware::from_fn(move |request, next| {
            let jwt_service = jwt_service.clone();
            async move { jwt_auth_middleware(jwt_service, request, next).await }
        }))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

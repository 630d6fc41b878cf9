//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repository/session wiring (in-memory or Postgres)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use lostfound_infra::{AppConfig, RepositoryError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, RepositoryError> {
    let services = services::build_services(config).await?;
    Ok(build_router(services))
}

/// Build the router around already-constructed services.
pub fn build_router(services: services::AppServices) -> Router {
    let auth_state = middleware::AuthState {
        repos: services.repos.clone(),
        accounts: services.accounts.clone(),
    };
    let services = Arc::new(services);

    // Every route below resolves an `AuthContext`; anonymous requests pass
    // through and are rejected by the workflows that need a user.
    let api = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    // Credential exchange ignores any stale bearer token the client still sends.
    let public = routes::public_router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(public)
        .merge(api)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_id_middleware)))
}

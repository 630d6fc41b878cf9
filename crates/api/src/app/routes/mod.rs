use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod claims;
pub mod items;
pub mod system;

/// Credential exchange, mounted outside the session layer.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Router for every endpoint behind the session layer.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/logout", post(auth::logout))
        .nest("/items", items::router())
        .route("/claims", post(claims::submit_claim))
        .route("/me/items", get(claims::my_items))
        .route("/me/claims", get(claims::my_claims))
}

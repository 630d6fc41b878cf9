use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use lostfound_auth::AuthContext;
use lostfound_core::DomainError;

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(actor): Extension<AuthContext>) -> Response {
    match actor.require_user() {
        Ok(user_id) => Json(serde_json::json!({ "user_id": user_id })).into_response(),
        Err(e) => errors::domain_error_to_response(DomainError::from(e)),
    }
}

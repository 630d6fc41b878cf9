use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use lostfound_core::DomainError;
use lostfound_infra::workflow::accounts;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::CurrentSession;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> Response {
    let body = match dto::json_body(body) {
        Ok(body) => body,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match accounts::register(
        &services.repos,
        &services.accounts,
        body.email.as_deref(),
        body.password.as_deref(),
    )
    .await
    {
        Ok(grant) => (StatusCode::CREATED, Json(grant)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CredentialsRequest>, JsonRejection>,
) -> Response {
    let body = match dto::json_body(body) {
        Ok(body) => body,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match accounts::login(
        &services.repos,
        &services.accounts,
        body.email.as_deref(),
        body.password.as_deref(),
    )
    .await
    {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Response {
    match session {
        Some(claims) => {
            accounts::logout(&services.accounts, &claims);
            StatusCode::NO_CONTENT.into_response()
        }
        None => errors::domain_error_to_response(DomainError::Unauthenticated),
    }
}

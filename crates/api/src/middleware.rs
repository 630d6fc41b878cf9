use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use lostfound_auth::SessionClaims;
use lostfound_infra::workflow::accounts::AccountServices;
use lostfound_infra::{Repositories, WorkflowError};

use crate::app::errors::{json_error, workflow_error_to_response};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AuthState {
    pub repos: Repositories,
    pub accounts: AccountServices,
}

/// The validated session behind the request, if any. Logout needs the
/// session id, not just the user.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionClaims>);

/// Resolve the request's `AuthContext` once.
///
/// No `Authorization` header means an anonymous actor. A header that is
/// present but malformed, expired, revoked or naming a user that no longer
/// exists is rejected with 401.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(msg) => return json_error(StatusCode::UNAUTHORIZED, "unauthenticated", msg),
    };

    let session = match state.accounts.session(&state.repos, token, Utc::now()).await {
        Ok(session) => session,
        Err(WorkflowError::Session(e)) => {
            tracing::debug!(error = %e, "rejected session token");
            return json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string());
        }
        Err(other) => return workflow_error_to_response(other),
    };

    let actor = match &session {
        Some(claims) => lostfound_auth::AuthContext::authenticated(claims.sub),
        None => lostfound_auth::AuthContext::anonymous(),
    };
    if let Some(user_id) = actor.user_id() {
        tracing::Span::current().record("user_id", tracing::field::display(user_id));
    }

    req.extensions_mut().insert(actor);
    req.extensions_mut().insert(CurrentSession(session));

    next.run(req).await
}

/// Tag each request with a UUIDv7 and run it inside a span carrying that id.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::now_v7);

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        user_id = tracing::field::Empty,
    );

    async move {
        let mut res = next.run(req).await;
        tracing::info!(status = res.status().as_u16(), "request completed");
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        res
    }
    .instrument(span)
    .await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| "authorization header is not valid text")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("expected a Bearer token")?
        .trim();

    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(Some(token))
}

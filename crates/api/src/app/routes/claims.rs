use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use serde_json::Value;

use lostfound_auth::AuthContext;
use lostfound_core::{DomainError, ItemId};
use lostfound_infra::WorkflowError;
use lostfound_infra::workflow::claims;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

fn item_location(item_id: ItemId) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("/items/{item_id}")).ok()
}

/// `POST /claims`. Both success and field validation failures point the
/// caller at the item's detail view via `Location`, as long as the body
/// carried a usable item id.
pub async fn submit_claim(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let (raw_item_id, body) = match body {
        Ok(Json(value)) => (dto::claim_item_id(&value), dto::SubmitClaimRequest::from_value(value)),
        Err(rejection) => (None, Err(dto::rejected(rejection))),
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => return invalid_claim(e, raw_item_id.as_deref()),
    };

    let result = claims::submit_claim(
        &services.repos,
        actor,
        raw_item_id.as_deref(),
        body.name.as_deref(),
        body.contact.as_deref(),
        body.message.as_deref(),
    )
    .await;

    match result {
        Ok(submitted) => {
            let mut res = (StatusCode::CREATED, Json(&submitted)).into_response();
            if let Some(location) = item_location(submitted.item.id) {
                res.headers_mut().insert(LOCATION, location);
            }
            res
        }
        Err(WorkflowError::Domain(e @ DomainError::InvalidInput(_))) => invalid_claim(e, raw_item_id.as_deref()),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

fn invalid_claim(err: DomainError, raw_item_id: Option<&str>) -> Response {
    let mut res = errors::domain_error_to_response(err);
    let valid_id = ItemId::parse_opt(raw_item_id).ok();
    if let Some(location) = valid_id.and_then(item_location) {
        res.headers_mut().insert(LOCATION, location);
    }
    res
}

pub async fn my_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
) -> Response {
    match claims::list_own_items(&services.repos, actor).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn my_claims(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
) -> Response {
    match claims::list_own_claims(&services.repos, actor).await {
        Ok(claims) => (StatusCode::OK, Json(serde_json::json!({ "claims": claims }))).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

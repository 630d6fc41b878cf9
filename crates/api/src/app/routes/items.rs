use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use lostfound_auth::AuthContext;
use lostfound_catalog::parse_picked_at;
use lostfound_core::DomainError;
use lostfound_infra::workflow::items;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(item_detail).patch(update_item).delete(delete_item))
        .route("/:id/edit", get(edit_form))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    query: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> Response {
    let criteria = query
        .map_err(|rejection| DomainError::invalid_input(rejection.body_text()))
        .and_then(|Query(query)| query.into_criteria());
    let criteria = match criteria {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::list_items(&services.repos, actor, criteria).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    body: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> Response {
    let parsed = dto::json_body(body).and_then(|body| Ok((parse_picked_at(body.picked_at.as_deref())?, body)));
    let (picked_at, body) = match parsed {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::create_item(
        &services.repos,
        actor,
        body.name.as_deref(),
        body.place.as_deref(),
        picked_at,
    )
    .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn item_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    let item_id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::item_detail(&services.repos, actor, item_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn edit_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    let item_id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::edit_form(&services.repos, actor, item_id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateItemRequest>, JsonRejection>,
) -> Response {
    let parsed = dto::parse_item_id(&id).and_then(|id| Ok((id, dto::json_body(body)?.into_patch()?)));
    let (item_id, patch) = match parsed {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::update_item(&services.repos, actor, item_id, patch).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    let item_id = match dto::parse_item_id(&id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items::delete_item(&services.repos, actor, item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

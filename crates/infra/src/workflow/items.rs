//! Item workflow: search, register, edit, delete and detail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use lostfound_auth::{AuthContext, ItemAction, authorize_item};
use lostfound_catalog::{
    EchoedFilters, Include, Item, ItemPatch, ItemView, NewItem, SearchCriteria,
};
use lostfound_core::{DomainError, ItemId};

use super::{Repositories, WorkflowError, WorkflowResult};
use crate::repository::{ItemRepository, RepositoryError};

/// Catalog listing plus the criteria that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemListing {
    pub items: Vec<ItemView>,
    pub filters: EchoedFilters,
}

#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn list_items(
    repos: &Repositories,
    actor: AuthContext,
    criteria: SearchCriteria,
) -> WorkflowResult<ItemListing> {
    actor.require_user()?;

    let filter = criteria.build();
    let items = repos
        .items
        .find_many(&filter, Include::LISTING)
        .await?;

    Ok(ItemListing {
        items,
        filters: criteria.echo(),
    })
}

#[instrument(skip(repos, name, place), fields(user_id = ?actor.user_id()), err)]
pub async fn create_item(
    repos: &Repositories,
    actor: AuthContext,
    name: Option<&str>,
    place: Option<&str>,
    picked_at: Option<DateTime<Utc>>,
) -> WorkflowResult<Item> {
    let registrant_id = actor.require_user()?;
    let new = NewItem::validate(registrant_id, name, place, picked_at)?;

    let item = repos.items.create(new).await.map_err(|e| match e {
        // registrant row gone while the session was still valid
        RepositoryError::MissingReference(_) => WorkflowError::Domain(DomainError::Unauthenticated),
        other => other.into(),
    })?;
    info!(item_id = %item.id, "item registered");
    Ok(item)
}

/// Load an item for editing. Only its registrant may see the edit form.
#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn edit_form(repos: &Repositories, actor: AuthContext, item_id: ItemId) -> WorkflowResult<Item> {
    actor.require_user()?;
    let item = load(repos, item_id, Include::NONE).await?.item;
    authorize_item(&actor, &item, ItemAction::Edit)?;
    Ok(item)
}

#[instrument(skip(repos, patch), fields(user_id = ?actor.user_id()), err)]
pub async fn update_item(
    repos: &Repositories,
    actor: AuthContext,
    item_id: ItemId,
    patch: ItemPatch,
) -> WorkflowResult<Item> {
    actor.require_user()?;

    let current = load(repos, item_id, Include::NONE).await?.item;
    authorize_item(&actor, &current, ItemAction::Edit)?;

    if patch.is_empty() {
        return Ok(current);
    }

    let item = repos.items.update(item_id, &patch).await?;
    info!(item_id = %item.id, "item updated");
    Ok(item)
}

/// Delete an item. Its claims go with it.
#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn delete_item(repos: &Repositories, actor: AuthContext, item_id: ItemId) -> WorkflowResult<()> {
    actor.require_user()?;

    let current = load(repos, item_id, Include::NONE).await?.item;
    authorize_item(&actor, &current, ItemAction::Delete)?;

    repos.items.delete(item_id).await?;
    info!(item_id = %item_id, "item deleted");
    Ok(())
}

/// Item with registrant, owner and the claims the actor is allowed to see.
#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn item_detail(repos: &Repositories, actor: AuthContext, item_id: ItemId) -> WorkflowResult<ItemView> {
    actor.require_user()?;

    let mut view = load(repos, item_id, Include::DETAIL).await?;
    authorize_item(&actor, &view.item, ItemAction::ViewDetail)?;
    view.retain_visible_claims(&actor);
    Ok(view)
}

async fn load(repos: &Repositories, item_id: ItemId, include: Include) -> WorkflowResult<ItemView> {
    repos
        .items
        .find_by_id(item_id, include)
        .await?
        .ok_or_else(|| DomainError::NotFound.into())
}

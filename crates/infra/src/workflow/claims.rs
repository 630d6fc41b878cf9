//! Claim workflow: submitting claims and the "my page" views.

use tracing::{info, instrument, warn};

use lostfound_auth::{AuthContext, ItemAction, authorize_item};
use lostfound_catalog::{Include, ItemFilter, ItemView, NewClaim, SubmittedClaim};
use lostfound_core::{DomainError, ItemId};

use super::{Repositories, WorkflowError, WorkflowResult};
use crate::repository::{ClaimRepository, ItemRepository, RepositoryError};

/// Submit a claim on an item.
///
/// Fields are validated before the item is looked up, so a malformed request
/// never reaches the store. Registrants may claim their own items.
#[instrument(skip(repos, name, contact, message), fields(user_id = ?actor.user_id()), err)]
pub async fn submit_claim(
    repos: &Repositories,
    actor: AuthContext,
    item_id: Option<&str>,
    name: Option<&str>,
    contact: Option<&str>,
    message: Option<&str>,
) -> WorkflowResult<SubmittedClaim> {
    let applicant_id = actor.require_user()?;
    let item_id = ItemId::parse_opt(item_id)?;
    let new = NewClaim::validate(applicant_id, item_id, name, contact, message)?;

    let item = repos
        .items
        .find_by_id(item_id, Include::NONE)
        .await?
        .ok_or(DomainError::NotFound)?
        .item;
    authorize_item(&actor, &item, ItemAction::SubmitClaim)?;

    let claim = match repos.claims.create(new).await {
        Ok(claim) => claim,
        Err(RepositoryError::MissingReference(reference)) => {
            return Err(missing_reference(repos, item_id, reference).await);
        }
        Err(e) => return Err(e.into()),
    };

    info!(claim_id = %claim.id, item_id = %item.id, "claim submitted");
    Ok(SubmittedClaim { claim, item })
}

/// The item was deleted between lookup and insert (`NotFound`), or the
/// applicant's user row is gone (`Unauthenticated`).
async fn missing_reference(repos: &Repositories, item_id: ItemId, reference: String) -> WorkflowError {
    match repos.items.find_by_id(item_id, Include::NONE).await {
        Ok(None) => DomainError::NotFound.into(),
        Ok(Some(_)) => {
            warn!(%reference, "claim applicant no longer exists");
            DomainError::Unauthenticated.into()
        }
        Err(e) => e.into(),
    }
}

/// Items the actor registered, each with every claim on it (newest first).
#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn list_own_items(repos: &Repositories, actor: AuthContext) -> WorkflowResult<Vec<ItemView>> {
    let user_id = actor.require_user()?;
    let items = repos
        .items
        .find_many(&ItemFilter::by_registrant(user_id), Include::DETAIL)
        .await?;
    Ok(items)
}

/// Claims the actor submitted, newest first, each with the claimed item.
#[instrument(skip(repos), fields(user_id = ?actor.user_id()), err)]
pub async fn list_own_claims(repos: &Repositories, actor: AuthContext) -> WorkflowResult<Vec<SubmittedClaim>> {
    let user_id = actor.require_user()?;
    let claims = repos.claims.find_by_applicant(user_id).await?;

    let mut out = Vec::with_capacity(claims.len());
    for view in claims {
        // Cascade delete may race this loop; a vanished item drops its claim.
        if let Some(item) = repos.items.find_by_id(view.claim.item_id, Include::NONE).await? {
            out.push(SubmittedClaim {
                claim: view.claim,
                item: item.item,
            });
        }
    }
    Ok(out)
}

//! Item/claim authorization policy.
//!
//! - No IO
//! - No panics
//! - No business logic beyond the ownership rules

use serde::Serialize;
use thiserror::Error;

use lostfound_core::{DomainError, UserId};

use crate::AuthContext;

/// Anything that was posted by a registrant (items, today).
pub trait RegisteredResource {
    fn registrant_id(&self) -> UserId;
}

/// Anything submitted by an applicant (claims, today).
pub trait ClaimResource {
    fn applicant_id(&self) -> UserId;
}

/// Operations an actor may attempt against a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    ViewDetail,
    Edit,
    Delete,
    SubmitClaim,
}

impl ItemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemAction::ViewDetail => "view",
            ItemAction::Edit => "edit",
            ItemAction::Delete => "delete",
            ItemAction::SubmitClaim => "claim",
        }
    }

    /// Whether the action is reserved to the item's registrant.
    pub fn requires_registrant(&self) -> bool {
        matches!(self, ItemAction::Edit | ItemAction::Delete)
    }
}

impl core::fmt::Display for ItemAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("only the registrant may {0} this item")]
    NotRegistrant(ItemAction),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => DomainError::Unauthenticated,
            e @ AuthzError::NotRegistrant(_) => DomainError::unauthorized(e.to_string()),
        }
    }
}

/// Authorize `action` on `item` for the given actor.
///
/// Returns the acting user id on success so callers never have to unwrap the
/// context a second time.
pub fn authorize_item<R>(actor: &AuthContext, item: &R, action: ItemAction) -> Result<UserId, AuthzError>
where
    R: RegisteredResource + ?Sized,
{
    let user_id = actor.require_user()?;

    if action.requires_registrant() && item.registrant_id() != user_id {
        return Err(AuthzError::NotRegistrant(action));
    }

    Ok(user_id)
}

pub fn can_mutate_item<R: RegisteredResource + ?Sized>(actor: &AuthContext, item: &R) -> bool {
    authorize_item(actor, item, ItemAction::Edit).is_ok()
}

pub fn can_delete_item<R: RegisteredResource + ?Sized>(actor: &AuthContext, item: &R) -> bool {
    authorize_item(actor, item, ItemAction::Delete).is_ok()
}

/// Items are catalog-wide: any authenticated actor may read them.
pub fn can_view_item_detail<R: RegisteredResource + ?Sized>(actor: &AuthContext, item: &R) -> bool {
    authorize_item(actor, item, ItemAction::ViewDetail).is_ok()
}

/// Registrants may claim their own items; nothing forbids it.
pub fn can_submit_claim<R: RegisteredResource + ?Sized>(actor: &AuthContext, item: &R) -> bool {
    authorize_item(actor, item, ItemAction::SubmitClaim).is_ok()
}

/// Claims are visible to the item's registrant and to the claim's applicant.
pub fn can_view_claim<R, C>(actor: &AuthContext, item: &R, claim: &C) -> bool
where
    R: RegisteredResource + ?Sized,
    C: ClaimResource + ?Sized,
{
    match actor.user_id() {
        Some(id) => id == item.registrant_id() || id == claim.applicant_id(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Posted(UserId);

    impl RegisteredResource for Posted {
        fn registrant_id(&self) -> UserId {
            self.0
        }
    }

    struct Submitted(UserId);

    impl ClaimResource for Submitted {
        fn applicant_id(&self) -> UserId {
            self.0
        }
    }

    fn uid(raw: i64) -> UserId {
        UserId::from_raw(raw)
    }

    #[test]
    fn registrant_may_mutate_and_delete() {
        let item = Posted(uid(1));
        let actor = AuthContext::authenticated(uid(1));
        assert!(can_mutate_item(&actor, &item));
        assert!(can_delete_item(&actor, &item));
        assert_eq!(authorize_item(&actor, &item, ItemAction::Edit), Ok(uid(1)));
    }

    #[test]
    fn anonymous_actor_is_denied_everything() {
        let item = Posted(uid(1));
        let actor = AuthContext::anonymous();
        assert!(!can_view_item_detail(&actor, &item));
        assert!(!can_submit_claim(&actor, &item));
        assert!(!can_mutate_item(&actor, &item));
        assert_eq!(
            authorize_item(&actor, &item, ItemAction::ViewDetail),
            Err(AuthzError::Unauthenticated)
        );
    }

    #[test]
    fn registrant_may_claim_own_item() {
        let item = Posted(uid(5));
        assert!(can_submit_claim(&AuthContext::authenticated(uid(5)), &item));
    }

    #[test]
    fn claim_visibility() {
        let item = Posted(uid(1));
        let claim = Submitted(uid(2));
        assert!(can_view_claim(&AuthContext::authenticated(uid(1)), &item, &claim));
        assert!(can_view_claim(&AuthContext::authenticated(uid(2)), &item, &claim));
        assert!(!can_view_claim(&AuthContext::authenticated(uid(3)), &item, &claim));
        assert!(!can_view_claim(&AuthContext::anonymous(), &item, &claim));
    }

    #[test]
    fn denial_maps_to_domain_unauthorized() {
        let err: DomainError = AuthzError::NotRegistrant(ItemAction::Delete).into();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        let err: DomainError = AuthzError::Unauthenticated.into();
        assert_eq!(err, DomainError::Unauthenticated);
    }

    proptest! {
        /// Property: no authenticated non-registrant can edit or delete an item,
        /// but every authenticated actor can view and claim it.
        #[test]
        fn non_registrants_cannot_mutate(registrant in 1i64..10_000, actor in 1i64..10_000) {
            prop_assume!(registrant != actor);
            let item = Posted(uid(registrant));
            let ctx = AuthContext::authenticated(uid(actor));

            prop_assert!(!can_mutate_item(&ctx, &item));
            prop_assert!(!can_delete_item(&ctx, &item));
            prop_assert_eq!(
                authorize_item(&ctx, &item, ItemAction::Edit),
                Err(AuthzError::NotRegistrant(ItemAction::Edit))
            );
            prop_assert!(can_view_item_detail(&ctx, &item));
            prop_assert!(can_submit_claim(&ctx, &item));
        }
    }
}

//! Read-time shapes: items with their related records eagerly loaded.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use lostfound_auth::{AuthContext, can_view_claim};

use crate::{Claim, Item, UserSummary};

/// Which relations a repository read should load alongside an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub registrant: bool,
    pub owner: bool,
    pub claims: bool,
}

impl Include {
    pub const NONE: Include = Include {
        registrant: false,
        owner: false,
        claims: false,
    };

    /// Catalog listings: registrant and owner summaries.
    pub const LISTING: Include = Include {
        registrant: true,
        owner: true,
        claims: false,
    };

    /// Detail page: everything, claims with their applicants.
    pub const DETAIL: Include = Include {
        registrant: true,
        owner: true,
        claims: true,
    };
}

/// A claim together with the applicant's public identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimView {
    #[serde(flatten)]
    pub claim: Claim,
    pub applicant: UserSummary,
}

/// An item plus whatever [`Include`] asked for. Unrequested relations are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub registrant: Option<UserSummary>,
    #[serde(default)]
    pub owner: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub claims: Option<Vec<ClaimView>>,
}

impl ItemView {
    pub fn bare(item: Item) -> Self {
        Self {
            item,
            registrant: None,
            owner: None,
            claims: None,
        }
    }

    /// Drop claims the actor is not allowed to see.
    pub fn retain_visible_claims(&mut self, actor: &AuthContext) {
        let item = &self.item;
        if let Some(claims) = self.claims.as_mut() {
            claims.retain(|c| can_view_claim(actor, item, &c.claim));
        }
    }
}

/// Result of a successful claim submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedClaim {
    pub claim: Claim,
    pub item: Item,
}

/// The one claim order: newest first, ties broken by id descending.
pub struct ClaimOrder;

impl ClaimOrder {
    pub const SQL: &'static str = "c.created_at DESC, c.id DESC";

    pub fn compare(a: &Claim, b: &Claim) -> Ordering {
        b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lostfound_core::{ClaimId, ItemId, UserId};

    fn summary(id: i64) -> UserSummary {
        UserSummary {
            id: UserId::from_raw(id),
            email: format!("u{id}@example.com"),
        }
    }

    fn claim(id: i64, applicant: i64) -> ClaimView {
        ClaimView {
            claim: Claim {
                id: ClaimId::from_raw(id),
                item_id: ItemId::from_raw(1),
                applicant_id: UserId::from_raw(applicant),
                name: "n".to_string(),
                contact: "c".to_string(),
                message: None,
                created_at: Utc::now() + Duration::seconds(id),
            },
            applicant: summary(applicant),
        }
    }

    fn detail() -> ItemView {
        let now = Utc::now();
        ItemView {
            item: Item {
                id: ItemId::from_raw(1),
                name: "wallet".to_string(),
                place: "gym".to_string(),
                picked_at: now,
                registrant_id: UserId::from_raw(1),
                owner_id: None,
                created_at: now,
            },
            registrant: Some(summary(1)),
            owner: None,
            claims: Some(vec![claim(1, 2), claim(2, 3), claim(3, 2)]),
        }
    }

    #[test]
    fn registrant_sees_every_claim() {
        let mut view = detail();
        view.retain_visible_claims(&AuthContext::authenticated(UserId::from_raw(1)));
        assert_eq!(view.claims.unwrap().len(), 3);
    }

    #[test]
    fn applicant_sees_only_their_claims() {
        let mut view = detail();
        view.retain_visible_claims(&AuthContext::authenticated(UserId::from_raw(2)));
        let ids: Vec<_> = view.claims.unwrap().iter().map(|c| c.claim.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn anonymous_sees_no_claims() {
        let mut view = detail();
        view.retain_visible_claims(&AuthContext::anonymous());
        assert!(view.claims.unwrap().is_empty());
    }

    #[test]
    fn serialized_view_is_flat() {
        let json = serde_json::to_value(detail()).unwrap();
        assert_eq!(json["name"], "wallet");
        assert_eq!(json["registrant"]["email"], "u1@example.com");
        assert_eq!(json["claims"][0]["applicant"]["id"], 2);
        assert!(json["owner"].is_null());
    }

    #[test]
    fn newest_claim_first() {
        let mut claims: Vec<Claim> = (1..=3).map(|i| claim(i, 2).claim).collect();
        claims.sort_by(ClaimOrder::compare);
        let ids: Vec<_> = claims.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}

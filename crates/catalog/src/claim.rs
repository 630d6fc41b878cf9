use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lostfound_auth::ClaimResource;
use lostfound_core::{
    ClaimId, DomainResult, Entity, ItemId, UserId,
    error::{optional_text, require_text},
};

/// An assertion by an applicant that an item belongs to them.
///
/// Immutable once created. Repeated claims by the same applicant on the same
/// item are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub item_id: ItemId,
    pub applicant_id: UserId,
    /// Display name the applicant wants the registrant to see.
    pub name: String,
    pub contact: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Claim {
    type Id = ClaimId;

    fn id(&self) -> ClaimId {
        self.id
    }
}

impl ClaimResource for Claim {
    fn applicant_id(&self) -> UserId {
        self.applicant_id
    }
}

/// Validated input for a claim submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub item_id: ItemId,
    pub applicant_id: UserId,
    pub name: String,
    pub contact: String,
    pub message: Option<String>,
}

impl NewClaim {
    pub fn validate(
        applicant_id: UserId,
        item_id: ItemId,
        name: Option<&str>,
        contact: Option<&str>,
        message: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            item_id,
            applicant_id,
            name: require_text("name", name)?,
            contact: require_text("contact", contact)?,
            message: optional_text(message),
        })
    }
}

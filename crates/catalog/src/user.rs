use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lostfound_core::{DomainError, DomainResult, Entity, UserId};

/// A registered account.
///
/// Not `Serialize` on purpose: the password hash must never leave the server.
/// Use [`User::summary`] for anything that crosses the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Public identity attached to items (registrant/owner) and claims (applicant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
}

/// Trim + lower-case an email and apply a basic shape check.
pub fn normalize_email(raw: Option<&str>) -> DomainResult<String> {
    let email = raw.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(DomainError::invalid_input("email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_lowercase()),
        _ => Err(DomainError::invalid_input("invalid email format")),
    }
}

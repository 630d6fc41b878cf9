//! Application workflows.
//!
//! Each workflow takes the request's [`AuthContext`](lostfound_auth::AuthContext)
//! by value, validates input, consults the authorization policy and only then
//! touches the repositories.
//!
//! ```text
//! request
//!   ↓
//! 1. resolve actor (session layer, once)
//!   ↓
//! 2. validate ids / fields (InvalidInput, nothing persisted)
//!   ↓
//! 3. read target immediately before the write
//!   ↓
//! 4. authorize against that read (Unauthorized / NotFound)
//!   ↓
//! 5. single repository write
//! ```

pub mod accounts;
pub mod claims;
pub mod items;

use std::sync::Arc;

use lostfound_auth::{AuthzError, PasswordError, TokenError};
use lostfound_core::DomainError;

use crate::repository::{ClaimRepository, InMemoryStore, ItemRepository, RepositoryError, UserRepository};

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Deterministic, caller-facing failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store failed; the caller cannot fix this.
    #[error("persistence failure: {0}")]
    PersistenceFailure(RepositoryError),

    #[error("session failure: {0}")]
    Session(TokenError),

    #[error("credential failure: {0}")]
    Credential(PasswordError),
}

impl From<AuthzError> for WorkflowError {
    fn from(value: AuthzError) -> Self {
        WorkflowError::Domain(value.into())
    }
}

/// Default mapping. Workflows that know better (e.g. duplicate email) map
/// the repository error themselves before it reaches this.
impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => WorkflowError::Domain(DomainError::NotFound),
            other => WorkflowError::PersistenceFailure(other),
        }
    }
}

impl From<TokenError> for WorkflowError {
    fn from(value: TokenError) -> Self {
        WorkflowError::Session(value)
    }
}

impl From<PasswordError> for WorkflowError {
    fn from(value: PasswordError) -> Self {
        WorkflowError::Credential(value)
    }
}

/// The repositories a workflow may use, constructed once at startup.
#[derive(Clone)]
pub struct Repositories {
    pub items: Arc<dyn ItemRepository>,
    pub claims: Arc<dyn ClaimRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Use one store for every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ItemRepository + ClaimRepository + UserRepository + 'static,
    {
        Self {
            items: store.clone(),
            claims: store.clone(),
            users: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::arc())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_outcomes() {
        assert!(matches!(
            WorkflowError::from(RepositoryError::NotFound),
            WorkflowError::Domain(DomainError::NotFound)
        ));
        assert!(matches!(
            WorkflowError::from(RepositoryError::Storage("down".into())),
            WorkflowError::PersistenceFailure(_)
        ));
    }

    #[test]
    fn authz_errors_map_to_domain_errors() {
        let err = WorkflowError::from(AuthzError::Unauthenticated);
        assert!(matches!(err, WorkflowError::Domain(DomainError::Unauthenticated)));
    }
}

//! Repository boundary for users, items and claims.
//!
//! Two adapters implement every trait here:
//! - [`InMemoryStore`]: default backend for dev and tests
//! - [`PostgresStore`]: `sqlx` backend, selected with `USE_PERSISTENT_STORES=true`
//!
//! Repositories only persist and load. Validation and authorization happen in
//! the workflows before any mutation reaches them.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use lostfound_catalog::{
    Claim, ClaimView, Include, Item, ItemFilter, ItemPatch, ItemView, NewClaim, NewItem,
    User,
};
use lostfound_core::{ItemId, UserId};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Repository error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The targeted row does not exist (or vanished between read and write).
    #[error("not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A referenced row does not exist (e.g. claiming a deleted item).
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// Backend failure (connection, poisoned lock, row decoding).
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist a new item. `picked_at = None` is stored as "now".
    async fn create(&self, new: NewItem) -> Result<Item, RepositoryError>;

    async fn find_by_id(&self, id: ItemId, include: Include) -> Result<Option<ItemView>, RepositoryError>;

    /// Matching items, latest `picked_at` first.
    async fn find_many(&self, filter: &ItemFilter, include: Include) -> Result<Vec<ItemView>, RepositoryError>;

    /// Apply a name/place patch. Other fields are never written.
    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, RepositoryError>;

    /// Delete an item together with its claims.
    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ClaimRepository: Send + Sync {
    async fn create(&self, new: NewClaim) -> Result<Claim, RepositoryError>;

    /// Claims on an item, newest first.
    async fn find_by_item(&self, item_id: ItemId) -> Result<Vec<ClaimView>, RepositoryError>;

    /// Claims an applicant submitted, newest first.
    async fn find_by_applicant(&self, applicant_id: UserId) -> Result<Vec<ClaimView>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. The email must already be normalized.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
impl<S> ItemRepository for Arc<S>
where
    S: ItemRepository + ?Sized,
{
    async fn create(&self, new: NewItem) -> Result<Item, RepositoryError> {
        (**self).create(new).await
    }

    async fn find_by_id(&self, id: ItemId, include: Include) -> Result<Option<ItemView>, RepositoryError> {
        (**self).find_by_id(id, include).await
    }

    async fn find_many(&self, filter: &ItemFilter, include: Include) -> Result<Vec<ItemView>, RepositoryError> {
        (**self).find_many(filter, include).await
    }

    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, RepositoryError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> ClaimRepository for Arc<S>
where
    S: ClaimRepository + ?Sized,
{
    async fn create(&self, new: NewClaim) -> Result<Claim, RepositoryError> {
        (**self).create(new).await
    }

    async fn find_by_item(&self, item_id: ItemId) -> Result<Vec<ClaimView>, RepositoryError> {
        (**self).find_by_item(item_id).await
    }

    async fn find_by_applicant(&self, applicant_id: UserId) -> Result<Vec<ClaimView>, RepositoryError> {
        (**self).find_by_applicant(applicant_id).await
    }
}

#[async_trait]
impl<S> UserRepository for Arc<S>
where
    S: UserRepository + ?Sized,
{
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError> {
        (**self).create(email, password_hash).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        (**self).find_first_by_email(email).await
    }
}

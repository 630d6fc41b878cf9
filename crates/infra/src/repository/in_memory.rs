//! In-memory repositories for tests/dev.
//!
//! Users, items and claims live behind a single lock so that deleting an item
//! and its claims is one atomic step.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use lostfound_catalog::{
    Claim, ClaimOrder, ClaimView, Include, Item, ItemFilter, ItemOrder, ItemPatch, ItemView, NewClaim, NewItem,
    User, UserSummary,
};
use lostfound_core::{ClaimId, Entity, ItemId, UserId};

use super::{ClaimRepository, ItemRepository, RepositoryError, UserRepository};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    claims: BTreeMap<ClaimId, Claim>,
    last_user_id: i64,
    last_item_id: i64,
    last_claim_id: i64,
}

impl State {
    fn summary(&self, id: UserId) -> Result<UserSummary, RepositoryError> {
        self.users
            .get(&id)
            .map(User::summary)
            .ok_or_else(|| RepositoryError::Storage(format!("dangling user reference {id}")))
    }

    fn claim_view(&self, claim: &Claim) -> Result<ClaimView, RepositoryError> {
        Ok(ClaimView {
            claim: claim.clone(),
            applicant: self.summary(claim.applicant_id)?,
        })
    }

    fn claims_where<F>(&self, pred: F) -> Result<Vec<ClaimView>, RepositoryError>
    where
        F: Fn(&Claim) -> bool,
    {
        let mut claims: Vec<&Claim> = self.claims.values().filter(|c| pred(c)).collect();
        claims.sort_by(|a, b| ClaimOrder::compare(a, b));
        claims.into_iter().map(|c| self.claim_view(c)).collect()
    }

    fn view(&self, item: &Item, include: Include) -> Result<ItemView, RepositoryError> {
        let mut view = ItemView::bare(item.clone());
        if include.registrant {
            view.registrant = Some(self.summary(item.registrant_id)?);
        }
        if include.owner {
            view.owner = item.owner_id.map(|id| self.summary(id)).transpose()?;
        }
        if include.claims {
            view.claims = Some(self.claims_where(|c| c.item_id == item.id)?);
        }
        Ok(view)
    }
}

fn put<E>(table: &mut BTreeMap<E::Id, E>, row: &E)
where
    E: Entity + Clone,
    E::Id: Ord,
{
    table.insert(row.id(), row.clone());
}

/// Single-process store implementing every repository trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Storage("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn create(&self, new: NewItem) -> Result<Item, RepositoryError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&new.registrant_id) {
            return Err(RepositoryError::MissingReference(format!("user {}", new.registrant_id)));
        }

        state.last_item_id += 1;
        let now = Utc::now();
        let item = Item {
            id: ItemId::from_raw(state.last_item_id),
            name: new.name,
            place: new.place,
            picked_at: new.picked_at.unwrap_or(now),
            registrant_id: new.registrant_id,
            owner_id: None,
            created_at: now,
        };
        put(&mut state.items, &item);
        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId, include: Include) -> Result<Option<ItemView>, RepositoryError> {
        let state = self.read()?;
        state.items.get(&id).map(|item| state.view(item, include)).transpose()
    }

    async fn find_many(&self, filter: &ItemFilter, include: Include) -> Result<Vec<ItemView>, RepositoryError> {
        let state = self.read()?;
        let mut items: Vec<&Item> = state.items.values().filter(|i| filter.matches(i)).collect();
        items.sort_by(|a, b| ItemOrder::compare(a, b));
        items.into_iter().map(|i| state.view(i, include)).collect()
    }

    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, RepositoryError> {
        let mut state = self.write()?;
        let item = state.items.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        patch.apply(item);
        Ok(item.clone())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.items.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.claims.retain(|_, c| c.item_id != id);
        Ok(())
    }
}

#[async_trait]
impl ClaimRepository for InMemoryStore {
    async fn create(&self, new: NewClaim) -> Result<Claim, RepositoryError> {
        let mut state = self.write()?;
        if !state.items.contains_key(&new.item_id) {
            return Err(RepositoryError::MissingReference(format!("item {}", new.item_id)));
        }
        if !state.users.contains_key(&new.applicant_id) {
            return Err(RepositoryError::MissingReference(format!("user {}", new.applicant_id)));
        }

        state.last_claim_id += 1;
        let claim = Claim {
            id: ClaimId::from_raw(state.last_claim_id),
            item_id: new.item_id,
            applicant_id: new.applicant_id,
            name: new.name,
            contact: new.contact,
            message: new.message,
            created_at: Utc::now(),
        };
        put(&mut state.claims, &claim);
        Ok(claim)
    }

    async fn find_by_item(&self, item_id: ItemId) -> Result<Vec<ClaimView>, RepositoryError> {
        self.read()?.claims_where(|c| c.item_id == item_id)
    }

    async fn find_by_applicant(&self, applicant_id: UserId) -> Result<Vec<ClaimView>, RepositoryError> {
        self.read()?.claims_where(|c| c.applicant_id == applicant_id)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::Duplicate(format!("email {email}")));
        }

        state.last_user_id += 1;
        let user = User {
            id: UserId::from_raw(state.last_user_id),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        put(&mut state.users, &user);
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    async fn user(store: &InMemoryStore, email: &str) -> UserId {
        UserRepository::create(store, email, "hash").await.unwrap().id
    }

    async fn item(store: &InMemoryStore, registrant: UserId, name: &str, hours_ago: i64) -> Item {
        let picked_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() - Duration::hours(hours_ago);
        ItemRepository::create(
            store,
            NewItem {
                name: name.to_string(),
                place: "station".to_string(),
                picked_at: Some(picked_at),
                registrant_id: registrant,
            },
        )
        .await
        .unwrap()
    }

    async fn claim(store: &InMemoryStore, item_id: ItemId, applicant: UserId) -> Result<Claim, RepositoryError> {
        ClaimRepository::create(
            store,
            NewClaim {
                item_id,
                applicant_id: applicant,
                name: "Hanako".to_string(),
                contact: "hanako@example.com".to_string(),
                message: None,
            },
        )
        .await
    }

    #[tokio::test]
    async fn ids_are_positive_and_increasing() {
        let store = InMemoryStore::new();
        let a = user(&store, "a@example.com").await;
        let b = user(&store, "b@example.com").await;
        assert_eq!(a.get(), 1);
        assert!(b > a);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        user(&store, "a@example.com").await;
        let res = UserRepository::create(&store, "a@example.com", "other").await;
        assert!(matches!(res, Err(RepositoryError::Duplicate(_))));
    }

    #[tokio::test]
    async fn missing_picked_at_defaults_to_now() {
        let store = InMemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let before = Utc::now();
        let created = ItemRepository::create(
            &store,
            NewItem {
                name: "key".to_string(),
                place: "park".to_string(),
                picked_at: None,
                registrant_id: owner,
            },
        )
        .await
        .unwrap();
        assert!(created.picked_at >= before);
        assert_eq!(created.picked_at, created.created_at);
    }

    #[tokio::test]
    async fn find_many_orders_by_picked_at_desc() {
        let store = InMemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        item(&store, owner, "old", 10).await;
        item(&store, owner, "new", 1).await;
        item(&store, owner, "mid", 5).await;

        let views = store.find_many(&ItemFilter::all(), Include::NONE).await.unwrap();
        let names: Vec<_> = views.iter().map(|v| v.item.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn include_attaches_relations() {
        let store = InMemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let other = user(&store, "other@example.com").await;
        let it = item(&store, owner, "wallet", 1).await;
        claim(&store, it.id, other).await.unwrap();
        claim(&store, it.id, owner).await.unwrap();

        let view = ItemRepository::find_by_id(&store, it.id, Include::DETAIL).await.unwrap().unwrap();
        assert_eq!(view.registrant.unwrap().email, "owner@example.com");
        assert!(view.owner.is_none());
        let claims = view.claims.unwrap();
        assert_eq!(claims.len(), 2);
        // newest first
        assert_eq!(claims[0].applicant.id, owner);

        let bare = ItemRepository::find_by_id(&store, it.id, Include::NONE).await.unwrap().unwrap();
        assert!(bare.registrant.is_none() && bare.claims.is_none());
    }

    #[tokio::test]
    async fn delete_cascades_to_claims() {
        let store = InMemoryStore::new();
        let owner = user(&store, "owner@example.com").await;
        let other = user(&store, "other@example.com").await;
        let it = item(&store, owner, "wallet", 1).await;
        claim(&store, it.id, other).await.unwrap();

        ItemRepository::delete(&store, it.id).await.unwrap();
        assert!(store.find_by_applicant(other).await.unwrap().is_empty());
        assert_eq!(ItemRepository::delete(&store, it.id).await, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn claim_on_missing_item_is_a_missing_reference() {
        let store = InMemoryStore::new();
        let applicant = user(&store, "a@example.com").await;
        let res = claim(&store, ItemId::from_raw(99), applicant).await;
        assert!(matches!(res, Err(RepositoryError::MissingReference(_))));
    }

    #[tokio::test]
    async fn update_touches_only_name_and_place() {
        let store = InMemoryStore::new();
        let owner = user(&store, "a@example.com").await;
        let it = item(&store, owner, "wallet", 1).await;
        let patch = ItemPatch {
            name: Some("brown wallet".to_string()),
            place: None,
        };
        let updated = store.update(it.id, &patch).await.unwrap();
        assert_eq!(updated.name, "brown wallet");
        assert_eq!(updated.place, it.place);
        assert_eq!(updated.picked_at, it.picked_at);
        assert_eq!(updated.registrant_id, it.registrant_id);

        assert_eq!(store.update(ItemId::from_raw(42), &patch).await, Err(RepositoryError::NotFound));
    }
}

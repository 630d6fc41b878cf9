//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `MissingReference` |
//! | Database (other) | Any other | `Storage` |
//! | RowNotFound | N/A | `NotFound` |
//! | Other | N/A | `Storage` |
//!
//! Claims reference items with `ON DELETE CASCADE`, so deleting an item is a
//! single statement.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Row};
use tracing::instrument;

use lostfound_catalog::{
    Claim, ClaimOrder, ClaimView, Include, Item, ItemFilter, ItemOrder, ItemPatch, ItemView, NewClaim, NewItem,
    User, UserSummary,
};
use lostfound_core::{ClaimId, ItemId, UserId};

use super::{ClaimRepository, ItemRepository, RepositoryError, UserRepository};

const ITEM_COLUMNS: &str = "i.id, i.name, i.place, i.picked_at, i.registrant_id, i.owner_id, i.created_at";

const CLAIM_COLUMNS: &str = "c.id, c.item_id, c.applicant_id, c.name, c.contact, c.message, c.created_at, \
                             u.email AS applicant_email";

/// Postgres implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the embedded migrations.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(format!("migration failed: {e}")))
    }

    /// Attach the relations requested by `include` to a page of items.
    async fn attach(&self, items: Vec<Item>, include: Include) -> Result<Vec<ItemView>, RepositoryError> {
        let mut users: HashMap<UserId, UserSummary> = HashMap::new();
        if include.registrant || include.owner {
            let ids: Vec<i64> = items
                .iter()
                .flat_map(|i| [Some(i.registrant_id), i.owner_id])
                .flatten()
                .map(i64::from)
                .collect();
            let rows = sqlx::query("SELECT id, email FROM users WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("load_users", e))?;
            for row in rows {
                let id = UserId::from_raw(row.try_get("id").map_err(decode_error)?);
                let email: String = row.try_get("email").map_err(decode_error)?;
                users.insert(id, UserSummary { id, email });
            }
        }

        let mut claims: HashMap<ItemId, Vec<ClaimView>> = HashMap::new();
        if include.claims && !items.is_empty() {
            let ids: Vec<i64> = items.iter().map(|i| i64::from(i.id)).collect();
            let sql = format!(
                "SELECT {CLAIM_COLUMNS} FROM claims c JOIN users u ON u.id = c.applicant_id \
                 WHERE c.item_id = ANY($1) ORDER BY {}",
                ClaimOrder::SQL
            );
            let rows = sqlx::query(&sql)
                .bind(&ids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("load_claims", e))?;
            for row in rows {
                let view: ClaimView = ClaimRow::from_row(&row).map_err(decode_error)?.into();
                claims.entry(view.claim.item_id).or_default().push(view);
            }
        }

        let lookup = |id: UserId| {
            users
                .get(&id)
                .cloned()
                .ok_or_else(|| RepositoryError::Storage(format!("dangling user reference {id}")))
        };

        items
            .into_iter()
            .map(|item| {
                let registrant = if include.registrant { Some(lookup(item.registrant_id)?) } else { None };
                let owner = if include.owner { item.owner_id.map(lookup).transpose()? } else { None };
                let item_claims = include.claims.then(|| claims.remove(&item.id).unwrap_or_default());
                Ok(ItemView {
                    item,
                    registrant,
                    owner,
                    claims: item_claims,
                })
            })
            .collect()
    }

    async fn claims_where(
        &self,
        operation: &str,
        column: &str,
        id: i64,
    ) -> Result<Vec<ClaimView>, RepositoryError> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims c JOIN users u ON u.id = c.applicant_id \
             WHERE c.{column} = $1 ORDER BY {}",
            ClaimOrder::SQL
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        rows.iter()
            .map(|row| ClaimRow::from_row(row).map(ClaimView::from).map_err(decode_error))
            .collect()
    }
}

#[async_trait]
impl ItemRepository for PostgresStore {
    #[instrument(skip(self, new), fields(registrant_id = %new.registrant_id), err)]
    async fn create(&self, new: NewItem) -> Result<Item, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (name, place, picked_at, registrant_id)
            VALUES ($1, $2, COALESCE($3, now()), $4)
            RETURNING id, name, place, picked_at, registrant_id, owner_id, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.place)
        .bind(new.picked_at)
        .bind(i64::from(new.registrant_id))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        Ok(ItemRow::from_row(&row).map_err(decode_error)?.into())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn find_by_id(&self, id: ItemId, include: Include) -> Result<Option<ItemView>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = $1");
        let row = sqlx::query(&sql)
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_item", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let item: Item = ItemRow::from_row(&row).map_err(decode_error)?.into();
        Ok(self.attach(vec![item], include).await?.pop())
    }

    #[instrument(skip(self), err)]
    async fn find_many(&self, filter: &ItemFilter, include: Include) -> Result<Vec<ItemView>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items i
            WHERE ($1::text IS NULL OR i.name ILIKE $1)
              AND ($2::text IS NULL OR i.place ILIKE $2)
              AND ($3::timestamptz IS NULL OR i.picked_at >= $3)
              AND ($4::timestamptz IS NULL OR i.picked_at <= $4)
              AND ($5::bigint IS NULL OR i.registrant_id = $5)
            ORDER BY {}
            "#,
            ItemOrder::SQL
        );
        let rows = sqlx::query(&sql)
            .bind(filter.name_contains.as_deref().map(ItemFilter::like_pattern))
            .bind(filter.place_contains.as_deref().map(ItemFilter::like_pattern))
            .bind(filter.picked_from)
            .bind(filter.picked_to)
            .bind(filter.registrant.map(i64::from))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_items", e))?;

        let items = rows
            .iter()
            .map(|row| ItemRow::from_row(row).map(Item::from).map_err(decode_error))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = items.len(), "items loaded");
        self.attach(items, include).await
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    async fn update(&self, id: ItemId, patch: &ItemPatch) -> Result<Item, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                place = COALESCE($3, place)
            WHERE id = $1
            RETURNING id, name, place, picked_at, registrant_id, owner_id, created_at
            "#,
        )
        .bind(i64::from(id))
        .bind(patch.name.as_deref())
        .bind(patch.place.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(ItemRow::from_row(&row).map_err(decode_error)?.into())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(i64::from(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimRepository for PostgresStore {
    #[instrument(skip(self, new), fields(item_id = %new.item_id, applicant_id = %new.applicant_id), err)]
    async fn create(&self, new: NewClaim) -> Result<Claim, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO claims (item_id, applicant_id, name, contact, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, item_id, applicant_id, name, contact, message, created_at
            "#,
        )
        .bind(i64::from(new.item_id))
        .bind(i64::from(new.applicant_id))
        .bind(&new.name)
        .bind(&new.contact)
        .bind(new.message.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_claim", e))?;

        claim_from_row(&row).map_err(decode_error)
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn find_by_item(&self, item_id: ItemId) -> Result<Vec<ClaimView>, RepositoryError> {
        self.claims_where("find_claims_by_item", "item_id", item_id.into()).await
    }

    #[instrument(skip(self), fields(applicant_id = %applicant_id), err)]
    async fn find_by_applicant(&self, applicant_id: UserId) -> Result<Vec<ClaimView>, RepositoryError> {
        self.claims_where("find_claims_by_applicant", "applicant_id", applicant_id.into())
            .await
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    #[instrument(skip(self, email, password_hash), err)]
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(UserRow::from_row(&row).map_err(decode_error)?.into())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(i64::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        row.map(|r| UserRow::from_row(&r).map(User::from).map_err(decode_error))
            .transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1 ORDER BY id LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.map(|r| UserRow::from_row(&r).map(User::from).map_err(decode_error))
            .transpose()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => RepositoryError::Duplicate(msg),
                Some("23503") => RepositoryError::MissingReference(msg),
                _ => RepositoryError::Storage(msg),
            }
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::PoolClosed => RepositoryError::Storage(format!("connection pool closed in {operation}")),
        other => RepositoryError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}

fn decode_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(format!("failed to decode row: {err}"))
}

struct ItemRow {
    id: i64,
    name: String,
    place: String,
    picked_at: DateTime<Utc>,
    registrant_id: i64,
    owner_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            place: row.try_get("place")?,
            picked_at: row.try_get("picked_at")?,
            registrant_id: row.try_get("registrant_id")?,
            owner_id: row.try_get("owner_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: ItemId::from_raw(row.id),
            name: row.name,
            place: row.place,
            picked_at: row.picked_at,
            registrant_id: UserId::from_raw(row.registrant_id),
            owner_id: row.owner_id.map(UserId::from_raw),
            created_at: row.created_at,
        }
    }
}

fn claim_from_row(row: &PgRow) -> Result<Claim, sqlx::Error> {
    Ok(Claim {
        id: ClaimId::from_raw(row.try_get("id")?),
        item_id: ItemId::from_raw(row.try_get("item_id")?),
        applicant_id: UserId::from_raw(row.try_get("applicant_id")?),
        name: row.try_get("name")?,
        contact: row.try_get("contact")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Claim joined with its applicant's email.
struct ClaimRow {
    claim: Claim,
    applicant_email: String,
}

impl<'r> FromRow<'r, PgRow> for ClaimRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ClaimRow {
            claim: claim_from_row(row)?,
            applicant_email: row.try_get("applicant_email")?,
        })
    }
}

impl From<ClaimRow> for ClaimView {
    fn from(row: ClaimRow) -> Self {
        ClaimView {
            applicant: UserSummary {
                id: row.claim.applicant_id,
                email: row.applicant_email,
            },
            claim: row.claim,
        }
    }
}

struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_raw(row.id),
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

//! Address repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use toko_core::{AddressId, UserId};

use super::{AddressStore, RepositoryError};
use crate::models::{Address, AddressPatch, NewAddress};

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    name: String,
    phone: String,
    full_address: String,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            name: row.name,
            phone: row.phone,
            full_address: row.full_address,
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL` address store.
#[derive(Clone)]
pub struct PgAddressStore {
    pool: PgPool,
}

impl PgAddressStore {
    /// Create a new address store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, name, phone, full_address, is_primary,
                   created_at, updated_at
            FROM toko.addresses
            WHERE user_id = $1
            ORDER BY is_primary DESC, created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, name, phone, full_address, is_primary,
                   created_at, updated_at
            FROM toko.addresses
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM toko.addresses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(
        &self,
        user_id: UserId,
        input: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO toko.addresses (user_id, label, name, phone, full_address, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, label, name, phone, full_address, is_primary,
                      created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.full_address)
        .bind(input.is_primary)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE toko.addresses SET
                label = COALESCE($3, label),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                full_address = COALESCE($6, full_address),
                is_primary = COALESCE($7, is_primary),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, label, name, phone, full_address, is_primary,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.label)
        .bind(&patch.name)
        .bind(&patch.phone)
        .bind(&patch.full_address)
        .bind(patch.is_primary)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn demote_all(
        &self,
        user_id: UserId,
        keep: Option<AddressId>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE toko.addresses
            SET is_primary = FALSE, updated_at = now()
            WHERE user_id = $1 AND is_primary AND ($2::int IS NULL OR id <> $2)
            ",
        )
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM toko.addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

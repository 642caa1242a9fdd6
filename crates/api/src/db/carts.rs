//! Cart line repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use toko_core::{CartLineId, ProductId, UserId};

use super::{CartStore, RepositoryError, conflict_on_unique, to_count, to_db_int};
use crate::models::CartLine;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    selected: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: to_count(row.quantity, "quantity")?,
            selected: row.selected,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL` cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, selected, created_at, updated_at
            FROM toko.cart_lines
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, selected, created_at, updated_at
            FROM toko.cart_lines
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn get_line(
        &self,
        user_id: UserId,
        id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, selected, created_at, updated_at
            FROM toko.cart_lines
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn insert_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO toko.cart_lines (user_id, product_id, quantity, selected)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, user_id, product_id, quantity, selected, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(to_db_int(quantity, "quantity")?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "cart line"))?;

        row.try_into()
    }

    async fn update_line(
        &self,
        user_id: UserId,
        id: CartLineId,
        quantity: Option<u32>,
        selected: Option<bool>,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let quantity = quantity.map(|q| to_db_int(q, "quantity")).transpose()?;

        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            UPDATE toko.cart_lines SET
                quantity = COALESCE($3, quantity),
                selected = COALESCE($4, selected),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, product_id, quantity, selected, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .bind(selected)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn delete_line(&self, user_id: UserId, id: CartLineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM toko.cart_lines WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_selected(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM toko.cart_lines WHERE user_id = $1 AND selected")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! Catalog repository: products and taxonomy master data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use toko_core::{CategoryId, MaterialId, Money, ProductId, ProductTypeId};

use super::{CatalogStore, RepositoryError, conflict_on_unique, to_count, to_db_int};
use crate::models::{NewProduct, Product, ProductPatch, TaxonomyEntry, TaxonomyKind};

const PRODUCT_COLUMNS: &str = r"
    id, sku, name, description, price, stock, buyable,
    category_id, type_id, material_id, seller_id, seller_name, image,
    created_at, updated_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    sku: Option<String>,
    name: String,
    description: String,
    price: Money,
    stock: i32,
    buyable: bool,
    category_id: Option<CategoryId>,
    type_id: Option<ProductTypeId>,
    material_id: Option<MaterialId>,
    seller_id: String,
    seller_name: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            sku: row.sku,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: to_count(row.stock, "stock")?,
            buyable: row.buyable,
            category_id: row.category_id,
            type_id: row.type_id,
            material_id: row.material_id,
            seller_id: row.seller_id,
            seller_name: row.seller_name,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaxonomyRow {
    id: i32,
    name: String,
}

impl From<TaxonomyRow> for TaxonomyEntry {
    fn from(row: TaxonomyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` catalog store.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM toko.products ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM toko.products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM toko.products WHERE id = ANY($1) ORDER BY id ASC"
        ))
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        into_products(rows)
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM toko.products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO toko.products (
                sku, name, description, price, stock, buyable,
                category_id, type_id, material_id, seller_id, seller_name, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(to_db_int(input.stock, "stock")?)
        .bind(input.buyable)
        .bind(input.category_id)
        .bind(input.type_id)
        .bind(input.material_id)
        .bind(&input.seller_id)
        .bind(&input.seller_name)
        .bind(&input.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product sku"))?;

        row.try_into()
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let stock = patch
            .stock
            .map(|s| to_db_int(s, "stock"))
            .transpose()?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE toko.products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                buyable = COALESCE($6, buyable),
                category_id = COALESCE($7, category_id),
                type_id = COALESCE($8, type_id),
                material_id = COALESCE($9, material_id),
                seller_id = COALESCE($10, seller_id),
                seller_name = COALESCE($11, seller_name),
                image = COALESCE($12, image),
                updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(stock)
        .bind(patch.buyable)
        .bind(patch.category_id)
        .bind(patch.type_id)
        .bind(patch.material_id)
        .bind(&patch.seller_id)
        .bind(&patch.seller_name)
        .bind(&patch.image)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM toko.products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_taxonomy(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "SELECT id, name FROM {} ORDER BY name ASC",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn taxonomy_exists(&self, kind: TaxonomyKind, id: i32) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            kind.table()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        name: &str,
    ) -> Result<TaxonomyEntry, RepositoryError> {
        let row = sqlx::query_as::<_, TaxonomyRow>(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            kind.table()
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, kind.label()))?;

        Ok(row.into())
    }
}

//! Catalog service: product reads with resolved taxonomy, admin writes.

use std::collections::HashMap;

use serde::Deserialize;

use toko_core::{CategoryId, MaterialId, Money, ProductId, ProductTypeId};

use super::ShopError;
use crate::db::{CatalogStore, RepositoryError};
use crate::models::{NewProduct, Product, ProductPatch, ProductView, TaxonomyEntry, TaxonomyKind};

/// Seller id used when a product is created without one.
pub const DEFAULT_SELLER_ID: &str = "01";
/// Seller name used when a product is created without one.
pub const DEFAULT_SELLER_NAME: &str = "Admin";

/// Product fields as sent by the admin client.
///
/// Every field is optional here; [`CatalogService::create_product`] enforces
/// which ones are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
    pub buyable: Option<bool>,
    pub category_id: Option<i32>,
    pub type_id: Option<i32>,
    pub material_id: Option<i32>,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub image: Option<String>,
}

/// Catalog operations over a [`CatalogStore`].
pub struct CatalogService<'a> {
    catalog: &'a dyn CatalogStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogStore) -> Self {
        Self { catalog }
    }

    /// All products with taxonomy resolved, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if the store fails.
    pub async fn list_products(&self) -> Result<Vec<ProductView>, ShopError> {
        let products = self.catalog.list_products().await?;
        let names = TaxonomyNames::load(self.catalog).await?;
        Ok(products.into_iter().map(|p| names.view(p)).collect())
    }

    /// A single product by its path id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed or unknown id.
    pub async fn get_product(&self, raw_id: &str) -> Result<ProductView, ShopError> {
        let id = parse_product_id(raw_id)?;
        let product = self
            .catalog
            .get_product(id)
            .await?
            .ok_or_else(|| ShopError::not_found("product"))?;
        self.view(product).await
    }

    /// Create a product, applying defaults for omitted fields.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidInput` for a missing name or price, negative
    /// values, or unknown taxonomy ids. Returns `ShopError::Conflict` if the
    /// SKU is taken.
    pub async fn create_product(&self, form: ProductForm) -> Result<ProductView, ShopError> {
        let name = non_empty(form.name.clone())
            .ok_or_else(|| ShopError::invalid("name is required"))?;
        let price = form
            .price
            .ok_or_else(|| ShopError::invalid("price is required"))
            .and_then(parse_price)?;
        let stock = form.stock.map(parse_stock).transpose()?.unwrap_or(0);
        self.check_taxonomy(&form).await?;

        let input = NewProduct {
            sku: non_empty(form.sku),
            name,
            description: form.description.unwrap_or_default(),
            price,
            stock,
            buyable: form.buyable.unwrap_or(true),
            category_id: form.category_id.map(CategoryId::new),
            type_id: form.type_id.map(ProductTypeId::new),
            material_id: form.material_id.map(MaterialId::new),
            seller_id: non_empty(form.seller_id).unwrap_or_else(|| DEFAULT_SELLER_ID.to_owned()),
            seller_name: non_empty(form.seller_name)
                .unwrap_or_else(|| DEFAULT_SELLER_NAME.to_owned()),
            image: form.image.unwrap_or_default(),
        };

        let product = self
            .catalog
            .create_product(&input)
            .await
            .map_err(conflict_to_shop)?;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        self.view(product).await
    }

    /// Partially update a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed or unknown id and
    /// `ShopError::InvalidInput` for invalid supplied fields. Nothing is written
    /// unless every supplied field is valid.
    pub async fn update_product(
        &self,
        raw_id: &str,
        form: ProductForm,
    ) -> Result<ProductView, ShopError> {
        let id = parse_product_id(raw_id)?;

        if form.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ShopError::invalid("name cannot be empty"));
        }
        let price = form.price.map(parse_price).transpose()?;
        let stock = form.stock.map(parse_stock).transpose()?;
        self.check_taxonomy(&form).await?;

        let patch = ProductPatch {
            name: form.name.map(|n| n.trim().to_owned()),
            description: form.description,
            price,
            stock,
            buyable: form.buyable,
            category_id: form.category_id.map(CategoryId::new),
            type_id: form.type_id.map(ProductTypeId::new),
            material_id: form.material_id.map(MaterialId::new),
            seller_id: non_empty(form.seller_id),
            seller_name: non_empty(form.seller_name),
            image: form.image,
        };

        let product = self
            .catalog
            .update_product(id, &patch)
            .await?
            .ok_or_else(|| ShopError::not_found("product"))?;
        tracing::info!(product_id = %product.id, "Product updated");
        self.view(product).await
    }

    /// Delete a product. Cart lines that reference it are left in place.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotFound` for a malformed or unknown id.
    pub async fn delete_product(&self, raw_id: &str) -> Result<(), ShopError> {
        let id = parse_product_id(raw_id)?;
        if !self.catalog.delete_product(id).await? {
            return Err(ShopError::not_found("product"));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// A taxonomy master list, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::StorageUnavailable` if the store fails.
    pub async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, ShopError> {
        Ok(self.catalog.list_taxonomy(kind).await?)
    }

    async fn view(&self, product: Product) -> Result<ProductView, ShopError> {
        let names = TaxonomyNames::load(self.catalog).await?;
        Ok(names.view(product))
    }

    async fn check_taxonomy(&self, form: &ProductForm) -> Result<(), ShopError> {
        let refs = [
            (TaxonomyKind::Category, form.category_id),
            (TaxonomyKind::ProductType, form.type_id),
            (TaxonomyKind::Material, form.material_id),
        ];
        for (kind, id) in refs {
            if let Some(id) = id
                && !self.catalog.taxonomy_exists(kind, id).await?
            {
                return Err(ShopError::invalid(format!("unknown {} id: {id}", kind.label())));
            }
        }
        Ok(())
    }
}

/// Taxonomy id → name lookups for resolving product references.
struct TaxonomyNames {
    by_kind: HashMap<TaxonomyKind, HashMap<i32, String>>,
}

impl TaxonomyNames {
    async fn load(catalog: &dyn CatalogStore) -> Result<Self, RepositoryError> {
        let mut by_kind = HashMap::new();
        for kind in TaxonomyKind::ALL {
            let entries = catalog.list_taxonomy(kind).await?;
            by_kind.insert(kind, entries.into_iter().map(|e| (e.id, e.name)).collect());
        }
        Ok(Self { by_kind })
    }

    fn resolve(&self, kind: TaxonomyKind, id: Option<i32>) -> Option<TaxonomyEntry> {
        let id = id?;
        let name = self.by_kind.get(&kind)?.get(&id)?;
        Some(TaxonomyEntry {
            id,
            name: name.clone(),
        })
    }

    fn view(&self, product: Product) -> ProductView {
        ProductView {
            category: self.resolve(
                TaxonomyKind::Category,
                product.category_id.map(|id| id.as_i32()),
            ),
            product_type: self.resolve(
                TaxonomyKind::ProductType,
                product.type_id.map(|id| id.as_i32()),
            ),
            material: self.resolve(
                TaxonomyKind::Material,
                product.material_id.map(|id| id.as_i32()),
            ),
            product,
        }
    }
}

fn parse_product_id(raw: &str) -> Result<ProductId, ShopError> {
    raw.parse().map_err(|_| ShopError::not_found("product"))
}

fn parse_price(price: i64) -> Result<Money, ShopError> {
    Money::new(price).map_err(|_| ShopError::invalid("price cannot be negative"))
}

fn parse_stock(stock: i64) -> Result<u32, ShopError> {
    if stock < 0 {
        return Err(ShopError::invalid("stock cannot be negative"));
    }
    // Stock is stored as a signed 32-bit column.
    i32::try_from(stock)
        .ok()
        .and_then(|s| u32::try_from(s).ok())
        .ok_or_else(|| ShopError::invalid("stock is too large"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn conflict_to_shop(e: RepositoryError) -> ShopError {
    match e {
        RepositoryError::Conflict(message) => ShopError::Conflict(message),
        other => ShopError::StorageUnavailable(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn form(name: &str, price: i64) -> ProductForm {
        ProductForm {
            name: Some(name.to_owned()),
            price: Some(price),
            ..ProductForm::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let view = catalog.create_product(form("Mouse", 250_000)).await.unwrap();
        assert_eq!(view.product.seller_id, "01");
        assert_eq!(view.product.seller_name, "Admin");
        assert_eq!(view.product.stock, 0);
        assert!(view.product.buyable);
        assert!(view.category.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        for bad in [
            form("  ", 10),
            form("Mouse", -1),
            ProductForm {
                stock: Some(-3),
                ..form("Mouse", 10)
            },
            ProductForm {
                category_id: Some(99),
                ..form("Mouse", 10)
            },
            ProductForm {
                name: Some("Mouse".to_owned()),
                ..ProductForm::default()
            },
        ] {
            assert!(matches!(
                catalog.create_product(bad).await,
                Err(ShopError::InvalidInput(_))
            ));
        }
        assert_eq!(store.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_taxonomy_resolved_in_views() {
        let store = MemoryStore::new();
        let category = store
            .create_taxonomy(TaxonomyKind::Category, "Elektronik")
            .await
            .unwrap();
        let catalog = CatalogService::new(&store);

        let created = catalog
            .create_product(ProductForm {
                category_id: Some(category.id),
                ..form("Laptop", 15_000_000)
            })
            .await
            .unwrap();
        assert_eq!(created.category, Some(category));

        let listed = catalog.list_products().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].category.as_ref().unwrap().name, "Elektronik");
    }

    #[tokio::test]
    async fn test_create_with_taxonomy_keeps_every_field() {
        let store = MemoryStore::new();
        let material = store
            .create_taxonomy(TaxonomyKind::Material, "Rotan")
            .await
            .unwrap();
        let catalog = CatalogService::new(&store);

        let created = catalog
            .create_product(ProductForm {
                sku: Some("p-010".to_owned()),
                description: Some("Anyaman tangan".to_owned()),
                image: Some("tas.jpg".to_owned()),
                material_id: Some(material.id),
                ..form("  Tas Rotan ", 175_000)
            })
            .await
            .unwrap();

        assert_eq!(created.product.name, "Tas Rotan");
        assert_eq!(created.product.sku.as_deref(), Some("p-010"));
        assert_eq!(created.product.description, "Anyaman tangan");
        assert_eq!(created.product.image, "tas.jpg");
        assert_eq!(created.material, Some(material));
    }

    #[tokio::test]
    async fn test_get_product_malformed_or_unknown_is_not_found() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        for raw in ["abc", "-1", "0", "424242"] {
            assert!(matches!(
                catalog.get_product(raw).await,
                Err(ShopError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_update_is_partial_and_validated() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog.create_product(form("Mouse", 250_000)).await.unwrap();
        let id = created.product.id.to_string();

        let updated = catalog
            .update_product(
                &id,
                ProductForm {
                    stock: Some(5),
                    ..ProductForm::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.product.stock, 5);
        assert_eq!(updated.product.name, "Mouse");
        assert_eq!(updated.product.price.as_i64(), 250_000);

        let rejected = catalog
            .update_product(
                &id,
                ProductForm {
                    stock: Some(9),
                    price: Some(-5),
                    ..ProductForm::default()
                },
            )
            .await;
        assert!(matches!(rejected, Err(ShopError::InvalidInput(_))));
        assert_eq!(
            store.get_product(created.product.id).await.unwrap().unwrap().stock,
            5
        );
    }

    #[tokio::test]
    async fn test_duplicate_sku_conflicts() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let with_sku = || ProductForm {
            sku: Some("p-001".to_owned()),
            ..form("Laptop", 1)
        };

        catalog.create_product(with_sku()).await.unwrap();
        assert!(matches!(
            catalog.create_product(with_sku()).await,
            Err(ShopError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_product() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog.create_product(form("Mouse", 1)).await.unwrap();
        let id = created.product.id.to_string();

        catalog.delete_product(&id).await.unwrap();
        assert!(matches!(
            catalog.delete_product(&id).await,
            Err(ShopError::NotFound(_))
        ));
    }
}

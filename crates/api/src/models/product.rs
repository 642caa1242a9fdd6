//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use toko_core::{CategoryId, MaterialId, Money, ProductId, ProductTypeId};

/// The three taxonomy master lists a product can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Category,
    ProductType,
    Material,
}

impl TaxonomyKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Category, Self::ProductType, Self::Material];

    /// Backing table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Category => "toko.categories",
            Self::ProductType => "toko.product_types",
            Self::Material => "toko.materials",
        }
    }

    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::ProductType => "product type",
            Self::Material => "material",
        }
    }
}

/// One row of a taxonomy master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: i32,
    pub name: String,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    /// Human product code, e.g. `p-001`.
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub buyable: bool,
    pub category_id: Option<CategoryId>,
    pub type_id: Option<ProductTypeId>,
    pub material_id: Option<MaterialId>,
    pub seller_id: String,
    pub seller_name: String,
    /// Image reference (file name or URL); uploads happen elsewhere.
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product. Defaults are applied by the catalog service.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub buyable: bool,
    pub category_id: Option<CategoryId>,
    pub type_id: Option<ProductTypeId>,
    pub material_id: Option<MaterialId>,
    pub seller_id: String,
    pub seller_name: String,
    pub image: String,
}

/// Partial product update; `None` leaves the stored value unchanged.
///
/// Taxonomy references can be replaced but not cleared.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub buyable: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub type_id: Option<ProductTypeId>,
    pub material_id: Option<MaterialId>,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub image: Option<String>,
}

impl ProductPatch {
    /// Apply the patch to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(buyable) = self.buyable {
            product.buyable = buyable;
        }
        if self.category_id.is_some() {
            product.category_id = self.category_id;
        }
        if self.type_id.is_some() {
            product.type_id = self.type_id;
        }
        if self.material_id.is_some() {
            product.material_id = self.material_id;
        }
        if let Some(seller_id) = &self.seller_id {
            product.seller_id.clone_from(seller_id);
        }
        if let Some(seller_name) = &self.seller_name {
            product.seller_name.clone_from(seller_name);
        }
        if let Some(image) = &self.image {
            product.image.clone_from(image);
        }
    }
}

/// A product with its taxonomy references resolved to names, as served by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<TaxonomyEntry>,
    #[serde(rename = "type")]
    pub product_type: Option<TaxonomyEntry>,
    pub material: Option<TaxonomyEntry>,
}

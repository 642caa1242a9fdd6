//! Demo catalog for empty databases.

use toko_core::Money;

use super::{CatalogStore, RepositoryError};
use crate::models::NewProduct;

struct DemoProduct {
    sku: &'static str,
    name: &'static str,
    price: i64,
    description: &'static str,
    image: &'static str,
    stock: u32,
}

const SELLER_ID: &str = "99";
const SELLER_NAME: &str = "Toko Lokal";

const DEMO_PRODUCTS: [DemoProduct; 3] = [
    DemoProduct {
        sku: "p-001",
        name: "Laptop Gaming Local",
        price: 15_000_000,
        description: "Laptop performa tinggi dengan kualitas terbaik.",
        image: "1768017607871-mahavir-shah-gtZxq2Rpa_Y-unsplash.jpg",
        stock: 10,
    },
    DemoProduct {
        sku: "p-002",
        name: "Mouse Wireless",
        price: 250_000,
        description: "Mouse wireless ergonomis untuk produktivitas.",
        image: "1768017557020-andrey-matveev-7eZeXqKAywU-unsplash.jpg",
        stock: 102,
    },
    DemoProduct {
        sku: "p-003",
        name: "Keyboard Mechanical",
        price: 850_000,
        description: "Keyboard mechanical RGB dengan switch blue.",
        image: "1768017521598-bady-abbas-jOmBUCtflWA-unsplash (1).jpg",
        stock: 32,
    },
];

/// Insert the demo products if the catalog is empty.
///
/// Returns the number of products inserted (0 when the catalog already has data).
///
/// # Errors
///
/// Returns `RepositoryError` if counting or inserting fails.
pub async fn seed_demo_catalog(catalog: &dyn CatalogStore) -> Result<usize, RepositoryError> {
    let existing = catalog.count_products().await?;
    if existing > 0 {
        tracing::info!(existing, "Catalog already populated, skipping seed");
        return Ok(0);
    }

    for demo in &DEMO_PRODUCTS {
        let price = Money::new(demo.price)
            .map_err(|e| RepositoryError::DataCorruption(format!("demo price: {e}")))?;
        catalog
            .create_product(&NewProduct {
                sku: Some(demo.sku.to_owned()),
                name: demo.name.to_owned(),
                description: demo.description.to_owned(),
                price,
                stock: demo.stock,
                buyable: true,
                category_id: None,
                type_id: None,
                material_id: None,
                seller_id: SELLER_ID.to_owned(),
                seller_name: SELLER_NAME.to_owned(),
                image: demo.image.to_owned(),
            })
            .await?;
    }

    tracing::info!(count = DEMO_PRODUCTS.len(), "Seeded demo catalog");
    Ok(DEMO_PRODUCTS.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_seeds_empty_catalog_once() {
        let store = MemoryStore::new();

        assert_eq!(seed_demo_catalog(&store).await.unwrap(), 3);
        assert_eq!(seed_demo_catalog(&store).await.unwrap(), 0);

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 3);
        let mouse = products
            .iter()
            .find(|p| p.sku.as_deref() == Some("p-002"))
            .unwrap();
        assert_eq!(mouse.price.as_i64(), 250_000);
        assert_eq!(mouse.stock, 102);
        assert_eq!(mouse.seller_name, "Toko Lokal");
    }
}

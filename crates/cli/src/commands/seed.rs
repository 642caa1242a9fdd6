//! Demo catalog seeding command.

use toko_api::db::{PgCatalogStore, seed};

use super::{CommandError, connect};

/// Insert the demo products if the catalog is empty.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let catalog = PgCatalogStore::new(pool);

    let inserted = seed::seed_demo_catalog(&catalog).await?;
    if inserted == 0 {
        tracing::info!("Catalog already has products, nothing seeded");
    } else {
        tracing::info!(inserted, "Demo catalog seeded");
    }
    Ok(())
}

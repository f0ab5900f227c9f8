//! Seed commands.

use cartwheel_storefront::services::CatalogService;

use super::{CommandError, connect};

/// Insert the sample products if the catalog is empty.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), CommandError> {
    let pool = connect().await?;

    let seeded = CatalogService::new(&pool).seed_sample_catalog().await?;
    if seeded == 0 {
        tracing::info!("Catalog already has products, nothing to seed");
    } else {
        tracing::info!(seeded, "Catalog seeded");
    }
    Ok(())
}

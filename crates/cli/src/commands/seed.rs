//! Catalog seed command.
//!
//! Populates the local catalog mirror with a handful of demo products for
//! local development. Upserts by provider id, so re-running is safe.

use mangaba_core::{Money, ProductId};
use mangaba_storefront::db::products::ProductRepository;

use super::{CommandError, database_url};

/// Demo products: (id, name, description, price in cents, category).
const DEMO_PRODUCTS: &[(&str, &str, &str, i64, &str)] = &[
    (
        "prod_mug_terracotta",
        "Terracotta Mug",
        "Hand-thrown terracotta mug, 300ml.",
        4500,
        "kitchen",
    ),
    (
        "prod_board_ipe",
        "Ipe Serving Board",
        "Solid ipe wood serving board with juice groove.",
        12900,
        "kitchen",
    ),
    (
        "prod_hammock_cotton",
        "Cotton Hammock",
        "Woven cotton hammock with hardwood spreader bars.",
        28900,
        "outdoor",
    ),
    (
        "prod_basket_fiber",
        "Fiber Storage Basket",
        "Natural fiber basket, medium size.",
        7900,
        "home",
    ),
    (
        "prod_candle_lime",
        "Lime & Basil Candle",
        "Soy wax candle, 40-hour burn time.",
        5900,
        "home",
    ),
];

/// Seed the catalog mirror with demo products.
///
/// # Errors
///
/// Returns `CommandError` if the database URL is missing or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = mangaba_storefront::db::create_pool(&url).await?;
    let repository = ProductRepository::new(&pool);

    for (id, name, description, price, category) in DEMO_PRODUCTS {
        let product_id = ProductId::from(*id);
        repository
            .upsert(
                &product_id,
                name,
                Some(description),
                Money::from_minor_units(*price),
                None,
                Some(category),
            )
            .await?;
        tracing::info!("seeded {id}");
    }

    tracing::info!("Seeded {} products", DEMO_PRODUCTS.len());
    Ok(())
}

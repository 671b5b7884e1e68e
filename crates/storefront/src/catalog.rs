//! Catalog reads with in-memory caching.
//!
//! Product detail lookups are cached with `moka` (5-minute TTL) since the
//! catalog mirror changes rarely and product pages are the hottest reads.
//! Listings always hit the database - their filter space is too wide to
//! cache usefully.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use mangaba_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::{ProductFilter, ProductRepository};
use crate::models::product::Product;

/// Cache TTL for product detail reads.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum cached products.
const CACHE_CAPACITY: u64 = 1000;

/// Cached access to the local catalog mirror.
#[derive(Clone)]
pub struct Catalog {
    pool: PgPool,
    cache: Cache<String, Product>,
}

impl Catalog {
    /// Create a catalog over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self { pool, cache }
    }

    /// Get a product by id, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let cache_key = format!("product:{id}");

        if let Some(product) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let product = ProductRepository::new(&self.pool).get(id).await?;

        if let Some(product) = &product {
            self.cache.insert(cache_key, product.clone()).await;
        }

        Ok(product)
    }

    /// List products matching the filter (uncached).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list(filter).await
    }
}

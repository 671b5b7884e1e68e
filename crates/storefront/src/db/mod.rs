//! Database operations for storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `profiles` - Shopper accounts (role, password hash)
//! - `addresses` - One shipping address per profile, upserted at checkout
//! - `products` - Local mirror of the provider catalog
//! - `orders` - Order headers (totals, freight, status, denormalized address)
//! - `orders_items` - Line-item snapshots, immutable after creation
//! - `reviews` - Product reviews
//! - `carts` - Persisted carts keyed by namespace (`cart-<id>` / `cart-guest`)
//! - `session` - tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p mangaba-cli -- migrate
//! ```

pub mod addresses;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod reviews;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

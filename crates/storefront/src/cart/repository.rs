//! Durable cart storage backends.
//!
//! The repository is keyed by namespace storage key (`cart-<profile id>` or
//! `cart-guest`) and stores the full line-item array as JSON, so a save is a
//! single upsert and concurrent writers resolve to last-writer-wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::PgPool;

use super::LineItem;
use crate::db::RepositoryError;

/// Storage backend for persisted carts.
///
/// Injected into [`CartStore`](super::CartStore) so the production Postgres
/// backend and the in-memory test backend are interchangeable.
pub trait CartRepository {
    /// Load the cart persisted under `key`, empty if none.
    fn load(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<LineItem>, RepositoryError>> + Send;

    /// Persist the full cart under `key`.
    fn save(
        &self,
        key: &str,
        items: &[LineItem],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the persisted cart under `key`.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

// =============================================================================
// Postgres backend
// =============================================================================

/// Postgres-backed cart storage (`carts` table, JSONB payload).
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for PgCartRepository {
    async fn load(&self, key: &str) -> Result<Vec<LineItem>, RepositoryError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT items FROM carts WHERE namespace = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => serde_json::from_value(value).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid cart payload for {key}: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, key: &str, items: &[LineItem]) -> Result<(), RepositoryError> {
        let payload = serde_json::to_value(items).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable cart for {key}: {e}"))
        })?;

        sqlx::query(
            r"
            INSERT INTO carts (namespace, items)
            VALUES ($1, $2)
            ON CONFLICT (namespace) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = now()
            ",
        )
        .bind(key)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE namespace = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// In-memory backend
// =============================================================================

/// In-memory cart storage for tests.
///
/// Cloning shares the underlying map, so a test can hold a handle and
/// observe what the store persisted.
#[derive(Clone, Default)]
pub struct InMemoryCartRepository {
    entries: Arc<Mutex<HashMap<String, Vec<LineItem>>>>,
}

impl InMemoryCartRepository {
    /// Create an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What is currently persisted under `key`, if anything.
    #[must_use]
    pub fn persisted(&self, key: &str) -> Option<Vec<LineItem>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl CartRepository for InMemoryCartRepository {
    async fn load(&self, key: &str) -> Result<Vec<LineItem>, RepositoryError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, key: &str, items: &[LineItem]) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), items.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

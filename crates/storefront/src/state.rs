//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::PgCartRepository;
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::services::payments::{PaymentsClient, PaymentsError};
use crate::services::postal::PostalClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections, provider clients, and
/// configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    payments: PaymentsClient,
    postal: PostalClient,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payments client cannot be constructed from
    /// the configured credentials.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentsError> {
        let payments = PaymentsClient::new(&config.payments)?;
        let postal = PostalClient::new(&config.postal);
        let catalog = Catalog::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                postal,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payments provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentsClient {
        &self.inner.payments
    }

    /// Get a reference to the postal lookup client.
    #[must_use]
    pub fn postal(&self) -> &PostalClient {
        &self.inner.postal
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// A cart repository over this state's pool.
    #[must_use]
    pub fn cart_repository(&self) -> PgCartRepository {
        PgCartRepository::new(self.inner.pool.clone())
    }
}

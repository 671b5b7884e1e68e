//! Catalog product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mangaba_core::{Money, ProductId};

/// A product from the local catalog mirror.
///
/// The catalog provider is the source of truth; rows here are synced
/// mirrors (see the CLI `seed` command for local development data).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use mangaba_core::ProductId;

use crate::db::products::ProductFilter;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub category: Option<String>,
    /// Substring match on the product name.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Product listing response.
#[derive(Debug, serde::Serialize)]
pub struct ProductListView {
    pub products: Vec<Product>,
    pub page: u32,
}

/// List products with optional category filter, search, and pagination.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListView>> {
    let filter = ProductFilter {
        category: query.category,
        search: query.q,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(0),
    };

    let products = state.catalog().list(&filter).await?;

    Ok(Json(ProductListView {
        products,
        page: filter.page.max(1),
    }))
}

/// Get a product by id.
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = state
        .catalog()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(product))
}

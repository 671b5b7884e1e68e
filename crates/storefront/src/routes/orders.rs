//! Account order history route handlers.
//!
//! Everything here is scoped to the authenticated profile; order ids that
//! belong to someone else read as not found.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use mangaba_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderItem};
use crate::state::AppState;

/// Order history response.
#[derive(Debug, serde::Serialize)]
pub struct OrderListView {
    pub orders: Vec<Order>,
}

/// Order detail response with item snapshots.
#[derive(Debug, serde::Serialize)]
pub struct OrderDetailView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// List the authenticated profile's orders, newest first.
#[instrument(skip(state, auth))]
pub async fn list(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<OrderListView>> {
    let RequireAuth(user) = auth;
    let orders = OrderRepository::new(state.pool())
        .list_for_profile(user.id)
        .await?;

    Ok(Json(OrderListView { orders }))
}

/// Get one of the authenticated profile's orders.
#[instrument(skip(state, auth))]
pub async fn detail(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDetailView>> {
    let RequireAuth(user) = auth;
    let (order, items) = OrderRepository::new(state.pool())
        .get_for_profile(order_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    Ok(Json(OrderDetailView { order, items }))
}

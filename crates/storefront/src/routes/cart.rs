//! Cart route handlers.
//!
//! The cart namespace follows the session's auth state: guests operate on
//! the guest namespace, logged-in shoppers on their profile namespace.
//! Every handler responds with the full cart view so clients never track
//! deltas.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use mangaba_core::{Money, ProductId};

use crate::cart::{CartRepository, CartStore, LineItem, Namespace, PgCartRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, serde::Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub unit_price_display: String,
    pub line_price_display: String,
    pub image: Option<String>,
}

/// Cart display data.
#[derive(Debug, serde::Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Money,
    pub subtotal_display: String,
    pub item_count: u32,
}

impl CartView {
    fn of<R: CartRepository>(cart: &CartStore<R>) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    unit_price_display: line.unit_price.to_string(),
                    line_price_display: line.subtotal().to_string(),
                    image: line.image.clone(),
                })
                .collect(),
            subtotal: cart.subtotal(),
            subtotal_display: cart.subtotal().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Open the cart for the request's identity.
pub(crate) async fn open_cart(
    state: &AppState,
    user: Option<&CurrentUser>,
) -> Result<CartStore<PgCartRepository>> {
    let namespace = Namespace::from(user.map(|u| u.id));
    Ok(CartStore::open(state.cart_repository(), namespace).await?)
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Show the current cart.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = open_cart(&state, auth.0.as_ref()).await?;
    Ok(Json(CartView::of(&cart)))
}

/// Add an item to the cart.
///
/// The line snapshots the product's current name, price, and image from the
/// catalog; an unknown product id is a 404.
#[instrument(skip(state, auth, request))]
pub async fn add(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let quantity = request.quantity.unwrap_or(1).max(1);

    let product = state
        .catalog()
        .get(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let mut cart = open_cart(&state, auth.0.as_ref()).await?;
    cart.add_item(LineItem {
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        image: product.image,
        quantity,
    })
    .await?;

    Ok(Json(CartView::of(&cart)))
}

/// Decrement a line's quantity by one (removing it at quantity 1).
#[instrument(skip(state, auth))]
pub async fn decrement(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, auth.0.as_ref()).await?;
    cart.remove_item(&product_id).await?;
    Ok(Json(CartView::of(&cart)))
}

/// Remove a line unconditionally.
#[instrument(skip(state, auth))]
pub async fn remove(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, auth.0.as_ref()).await?;
    cart.clear_item(&product_id).await?;
    Ok(Json(CartView::of(&cart)))
}

/// Clear the cart.
#[instrument(skip(state, auth))]
pub async fn clear(
    State(state): State<AppState>,
    auth: OptionalAuth,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, auth.0.as_ref()).await?;
    cart.clear_cart().await?;
    Ok(Json(CartView::of(&cart)))
}

//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database ping)
//!
//! # Catalog
//! GET  /products                   - Product listing (filter/search/pagination)
//! GET  /products/{id}              - Product detail
//! GET  /products/{id}/reviews      - Reviews + aggregate summary
//! POST /products/{id}/reviews      - Create review (requires auth)
//!
//! # Cart
//! GET    /cart                     - Current cart for the active identity
//! POST   /cart/items               - Add item (quantity defaults to 1)
//! POST   /cart/items/{id}/decrement - Decrement quantity by one
//! DELETE /cart/items/{id}          - Remove line unconditionally
//! DELETE /cart                     - Clear cart
//!
//! # Checkout
//! PUT  /checkout/address           - Save/validate the address form
//! POST /checkout/freight           - Compute freight options
//! POST /checkout/freight/select    - Select a freight option
//! POST /checkout                   - Submit checkout (requires auth)
//! GET  /checkout/result            - Reconcile a returned payment session
//!
//! # Auth
//! POST /auth/register              - Register and log in
//! POST /auth/login                 - Login
//! POST /auth/logout                - Logout
//!
//! # Account (requires auth)
//! GET  /account/orders             - Order history
//! GET  /account/orders/{id}        - Order detail with item snapshots
//! GET  /account/address            - Saved address (null if none)
//! PUT  /account/address            - Replace the saved address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::detail))
        .route(
            "/products/{id}/reviews",
            get(reviews::list).post(reviews::create),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route("/cart/items/{id}/decrement", post(cart::decrement))
        .route("/cart/items/{id}", delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::submit))
        .route("/checkout/address", put(checkout::save_address))
        .route("/checkout/freight", post(checkout::quote_freight))
        .route("/checkout/freight/select", post(checkout::select_freight))
        .route("/checkout/result", get(checkout::result))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/orders", get(orders::list))
        .route("/account/orders/{id}", get(orders::detail))
        .route(
            "/account/address",
            get(account::show_address).put(account::save_address),
        )
}

/// Create the complete storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(checkout_routes())
        .merge(auth_routes())
        .merge(account_routes())
}

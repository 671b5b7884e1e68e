//! Order and order-item models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mangaba_core::{Money, OrderId, OrderStatus, ProductId, ProfileId};

/// A persisted order header.
///
/// Created once at checkout submission with status `processing`; the
/// reconciler later moves it to `paid` or `canceled`. Address fields are
/// denormalized at creation time so later address edits never rewrite
/// order history. Orders are never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub profile_id: ProfileId,
    /// Grand total: line-item subtotals plus freight.
    pub total_price: Money,
    pub shipping_price: Money,
    pub shipping_carrier: String,
    pub status: OrderStatus,
    /// Payment method reported by the provider, filled in by the reconciler.
    pub payment_method: Option<String>,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub complement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line-item snapshot attached to an order.
///
/// Captures price and quantity at order-creation time, decoupled from any
/// later catalog price changes. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i32,
}

/// Input for creating an order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub profile_id: ProfileId,
    pub total_price: Money,
    pub shipping_price: Money,
    pub shipping_carrier: String,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub complement: Option<String>,
}

/// Input for creating one order-item snapshot.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: i32,
}

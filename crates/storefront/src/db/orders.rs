//! Order repository for database operations.
//!
//! Order creation is two steps (header, then item snapshots) with no
//! enclosing transaction: a failure between the two leaves the header
//! committed. This mirrors the checkout flow's documented lack of
//! compensation; see DESIGN.md.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mangaba_core::{Money, OrderId, OrderStatus, ProductId, ProfileId};

use super::RepositoryError;
use crate::models::order::{NewOrder, NewOrderItem, Order, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    profile_id: i32,
    total_price: i64,
    shipping_price: i64,
    shipping_carrier: String,
    status: String,
    payment_method: Option<String>,
    postal_code: String,
    street: String,
    number: String,
    neighborhood: String,
    city: String,
    region: String,
    complement: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str_opt(&row.status).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown order status: {}", row.status))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            profile_id: ProfileId::new(row.profile_id),
            total_price: Money::from_minor_units(row.total_price),
            shipping_price: Money::from_minor_units(row.shipping_price),
            shipping_carrier: row.shipping_carrier,
            status,
            payment_method: row.payment_method,
            postal_code: row.postal_code,
            street: row.street,
            number: row.number,
            neighborhood: row.neighborhood,
            city: row.city,
            region: row.region,
            complement: row.complement,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: String,
    name: String,
    price: i64,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: Money::from_minor_units(row.price),
            quantity: row.quantity,
        }
    }
}

const ORDER_COLUMNS: &str = r"id, profile_id, total_price, shipping_price, shipping_carrier,
    status, payment_method, postal_code, street, number, neighborhood, city,
    region, complement, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order header with status `processing`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders
                (profile_id, total_price, shipping_price, shipping_carrier, status,
                 postal_code, street, number, neighborhood, city, region, complement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            ",
        ))
        .bind(order.profile_id.as_i32())
        .bind(order.total_price.minor_units())
        .bind(order.shipping_price.minor_units())
        .bind(&order.shipping_carrier)
        .bind(OrderStatus::Processing.as_str())
        .bind(&order.postal_code)
        .bind(&order.street)
        .bind(&order.number)
        .bind(&order.neighborhood)
        .bind(&order.city)
        .bind(&order.region)
        .bind(order.complement.as_deref())
        .fetch_one(self.pool)
        .await?;

        Order::try_from(row)
    }

    /// Insert the line-item snapshots for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on the first failing insert;
    /// previously inserted items stay committed.
    pub async fn insert_items(
        &self,
        order_id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<(), RepositoryError> {
        for item in items {
            sqlx::query(
                r"
                INSERT INTO orders_items (order_id, product_id, name, price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id.as_i32())
            .bind(item.product_id.as_str())
            .bind(&item.name)
            .bind(item.price.minor_units())
            .bind(item.quantity)
            .execute(self.pool)
            .await?;
        }

        Ok(())
    }

    /// Get an order (with items) scoped to its owning profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_profile(
        &self,
        order_id: OrderId,
        profile_id: ProfileId,
    ) -> Result<Option<(Order, Vec<OrderItem>)>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE id = $1 AND profile_id = $2
            ",
        ))
        .bind(order_id.as_i32())
        .bind(profile_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_id, product_id, name, price, quantity
            FROM orders_items
            WHERE order_id = $1
            ORDER BY product_id
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(Some((
            order,
            item_rows.into_iter().map(OrderItem::from).collect(),
        )))
    }

    /// List a profile's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE profile_id = $1
            ORDER BY created_at DESC
            ",
        ))
        .bind(profile_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Update an order's status and payment method after reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        payment_method: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2,
                payment_method = COALESCE($3, payment_method),
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(order_id.as_i32())
        .bind(status.as_str())
        .bind(payment_method)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

//! Checkout aggregator: cart + freight + address into one order submission.
//!
//! The submission is sequential remote writes with no compensating
//! rollback: address upsert, order insert, item snapshots, then the hosted
//! payment session. A failure partway leaves the earlier writes committed
//! and surfaces the error to the caller (see DESIGN.md).
//!
//! Precondition checks and the money arithmetic are pure functions so they
//! are testable without a database or provider.

use std::collections::BTreeMap;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use mangaba_core::{Money, OrderId, ProfileId};

use crate::cart::LineItem;
use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::orders::OrderRepository;
use crate::models::order::{NewOrder, NewOrderItem};
use crate::services::payments::{
    CreateSessionRequest, PaymentsClient, PaymentsError, SessionLineItem,
};
use crate::shipping::{AddressForm, FreightOption};

/// Errors from checkout submission.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No authenticated identity.
    #[error("authentication required")]
    Unauthenticated,

    /// The cart holds no items.
    #[error("cart is empty")]
    EmptyCart,

    /// No freight option has been selected.
    #[error("no freight option selected")]
    NoFreightSelected,

    /// The address is missing required fields.
    #[error("address is incomplete")]
    InvalidAddress(BTreeMap<&'static str, String>),

    /// A database write failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The payment session could not be created.
    #[error("payments error: {0}")]
    Payments(#[from] PaymentsError),
}

/// The inputs gathered for a checkout attempt.
#[derive(Debug)]
pub struct CheckoutRequest<'a> {
    /// The authenticated profile, if any.
    pub identity: Option<ProfileId>,
    pub items: &'a [LineItem],
    pub address: &'a AddressForm,
    pub freight: Option<&'a FreightOption>,
}

/// A checkout request that passed every precondition.
#[derive(Debug)]
struct ValidCheckout<'a> {
    profile_id: ProfileId,
    items: &'a [LineItem],
    address: &'a AddressForm,
    freight: &'a FreightOption,
}

/// Check every precondition before any remote write happens.
///
/// Order matters only in that authentication is checked first; every
/// failure leaves the database untouched.
fn validate_request<'a>(request: &CheckoutRequest<'a>) -> Result<ValidCheckout<'a>, CheckoutError> {
    let profile_id = request.identity.ok_or(CheckoutError::Unauthenticated)?;

    if request.items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let errors = request.address.validate();
    if !errors.is_empty() {
        return Err(CheckoutError::InvalidAddress(errors));
    }

    let freight = request.freight.ok_or(CheckoutError::NoFreightSelected)?;

    Ok(ValidCheckout {
        profile_id,
        items: request.items,
        address: request.address,
        freight,
    })
}

/// Grand total: line-item subtotals plus the freight price.
#[must_use]
pub fn grand_total(items: &[LineItem], freight_price: Money) -> Money {
    items.iter().map(LineItem::subtotal).sum::<Money>() + freight_price
}

/// Mirror the cart into payment-session lines, freight as the last line.
#[must_use]
pub fn build_session_lines(items: &[LineItem], freight: &FreightOption) -> Vec<SessionLineItem> {
    let mut lines: Vec<SessionLineItem> = items
        .iter()
        .map(|item| SessionLineItem {
            description: item.name.clone(),
            unit_amount: item.unit_price,
            quantity: item.quantity,
        })
        .collect();

    lines.push(SessionLineItem {
        description: format!("Shipping ({})", freight.carrier),
        unit_amount: freight.price,
        quantity: 1,
    });

    lines
}

/// Where the hosted payment page returns to, for both success and cancel.
/// The `{CHECKOUT_SESSION_ID}` placeholder is substituted by the provider.
fn result_url(base_url: &str) -> String {
    format!(
        "{}/checkout/result?session_id={{CHECKOUT_SESSION_ID}}",
        base_url.trim_end_matches('/')
    )
}

/// Outcome of a successful submission: the created order and the hosted
/// payment page to redirect the shopper to.
#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
    pub order_id: OrderId,
    pub url: String,
}

/// Assembles and submits a checkout.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    payments: &'a PaymentsClient,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a PaymentsClient, base_url: &'a str) -> Self {
        Self {
            pool,
            payments,
            base_url,
        }
    }

    /// Submit a checkout: persist the address, create the order and its
    /// item snapshots, create the payment session, and return the redirect.
    ///
    /// # Errors
    ///
    /// Precondition failures (`Unauthenticated`, `EmptyCart`,
    /// `NoFreightSelected`, `InvalidAddress`) happen before any write.
    /// Later failures abort the flow but do not roll back earlier writes.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn submit(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutRedirect, CheckoutError> {
        let valid = validate_request(&request)?;
        let new_address = valid.address.to_new_address();

        AddressRepository::new(self.pool)
            .upsert_for_profile(valid.profile_id, &new_address)
            .await?;

        let orders = OrderRepository::new(self.pool);
        let order = orders
            .insert(&NewOrder {
                profile_id: valid.profile_id,
                total_price: grand_total(valid.items, valid.freight.price),
                shipping_price: valid.freight.price,
                shipping_carrier: valid.freight.carrier.clone(),
                postal_code: new_address.postal_code.clone(),
                street: new_address.street.clone(),
                number: new_address.number.clone(),
                neighborhood: new_address.neighborhood.clone(),
                city: new_address.city.clone(),
                region: new_address.region.clone(),
                complement: new_address.complement.clone(),
            })
            .await?;

        let item_snapshots: Vec<NewOrderItem> = valid
            .items
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                price: item.unit_price,
                quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
            })
            .collect();
        orders.insert_items(order.id, &item_snapshots).await?;

        let url = result_url(self.base_url);
        let session = self
            .payments
            .create_checkout_session(&CreateSessionRequest {
                line_items: build_session_lines(valid.items, valid.freight),
                order_id: order.id,
                success_url: url.clone(),
                cancel_url: url,
            })
            .await?;

        tracing::info!(order_id = %order.id, session_id = %session.id, "checkout session created");

        Ok(CheckoutRedirect {
            order_id: order.id,
            url: session.url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mangaba_core::ProductId;

    fn item(id: &str, price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::from(id),
            name: format!("Product {id}"),
            unit_price: Money::from_minor_units(price),
            image: None,
            quantity,
        }
    }

    fn valid_address() -> AddressForm {
        AddressForm {
            postal_code: "01001000".to_owned(),
            street: "Praça da Sé".to_owned(),
            number: "100".to_owned(),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            region: "SP".to_owned(),
            complement: None,
        }
    }

    fn express_freight() -> FreightOption {
        FreightOption {
            carrier: "Express".to_owned(),
            price: Money::from_minor_units(1490),
            delivery_days: 2,
        }
    }

    #[test]
    fn test_validate_requires_authentication() {
        let items = [item("prod_a", 1000, 1)];
        let address = valid_address();
        let freight = express_freight();
        let request = CheckoutRequest {
            identity: None,
            items: &items,
            address: &address,
            freight: Some(&freight),
        };

        assert!(matches!(
            validate_request(&request),
            Err(CheckoutError::Unauthenticated)
        ));
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        let address = valid_address();
        let freight = express_freight();
        let request = CheckoutRequest {
            identity: Some(ProfileId::new(1)),
            items: &[],
            address: &address,
            freight: Some(&freight),
        };

        assert!(matches!(
            validate_request(&request),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_validate_rejects_missing_freight() {
        let items = [item("prod_a", 1000, 1)];
        let address = valid_address();
        let request = CheckoutRequest {
            identity: Some(ProfileId::new(1)),
            items: &items,
            address: &address,
            freight: None,
        };

        assert!(matches!(
            validate_request(&request),
            Err(CheckoutError::NoFreightSelected)
        ));
    }

    #[test]
    fn test_validate_rejects_incomplete_address() {
        let items = [item("prod_a", 1000, 1)];
        let mut address = valid_address();
        address.city = String::new();
        let freight = express_freight();
        let request = CheckoutRequest {
            identity: Some(ProfileId::new(1)),
            items: &items,
            address: &address,
            freight: Some(&freight),
        };

        match validate_request(&request) {
            Err(CheckoutError::InvalidAddress(errors)) => {
                assert!(errors.contains_key("city"));
            }
            other => panic!("expected InvalidAddress, got {other:?}"),
        }
    }

    #[test]
    fn test_grand_total_adds_freight() {
        let items = [item("prod_a", 2500, 4), item("prod_b", 10000, 1)];
        let total = grand_total(&items, Money::from_minor_units(1490));
        assert_eq!(total.minor_units(), 21490);
    }

    #[test]
    fn test_session_lines_mirror_cart_plus_freight() {
        let items = [item("prod_a", 2500, 2)];
        let lines = build_session_lines(&items, &express_freight());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].description, "Product prod_a");
        assert_eq!(lines[0].unit_amount.minor_units(), 2500);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].description, "Shipping (Express)");
        assert_eq!(lines[1].unit_amount.minor_units(), 1490);
        assert_eq!(lines[1].quantity, 1);
    }

    #[test]
    fn test_result_url_placeholder() {
        let url = result_url("https://shop.test/");
        assert_eq!(
            url,
            "https://shop.test/checkout/result?session_id={CHECKOUT_SESSION_ID}"
        );
    }
}

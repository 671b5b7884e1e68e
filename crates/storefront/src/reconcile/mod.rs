//! Order/payment status reconciler.
//!
//! After the shopper returns from the hosted payment page, the session is
//! fetched and its payment-intent status mapped to a [`PaymentOutcome`].
//! The page renders from that live status; mirroring it into the order
//! record is a best-effort side effect whose failure is logged, never
//! surfaced. Status mapping, order persistence, and cart settlement are
//! deliberately separate so each is testable on its own.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use mangaba_core::{OrderId, PaymentOutcome};

use crate::cart::{CartRepository, CartStore};
use crate::db::orders::OrderRepository;
use crate::services::payments::{PaymentsError, SessionDetails, SessionSource};

/// Errors from reconciliation.
///
/// Only failures to *read* the session surface; persistence failures are
/// swallowed by design.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The session id from the return URL matches nothing.
    #[error("checkout session not found: {0}")]
    SessionNotFound(String),

    /// The payments provider could not be queried.
    #[error("payments error: {0}")]
    Payments(PaymentsError),
}

/// The resolved outcome of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    pub outcome: PaymentOutcome,
    /// Order id recovered from session metadata, if any.
    pub order_id: Option<OrderId>,
    /// Payment method reported by the provider, if any.
    pub payment_method: Option<String>,
}

/// Map a raw payment-intent status onto an outcome.
///
/// `succeeded` is the only paying status; any other reported status is a
/// terminal non-payment; a missing intent or status is unknown.
#[must_use]
pub fn map_intent_status(status: Option<&str>) -> PaymentOutcome {
    match status {
        Some("succeeded") => PaymentOutcome::Paid,
        Some(_) => PaymentOutcome::Canceled,
        None => PaymentOutcome::Unknown,
    }
}

/// Clear the cart when - and only when - the payment went through.
///
/// Invoked exactly once per reconciliation pass. A persistence failure is
/// logged and ignored; the shopper's result page does not depend on it.
pub async fn settle_cart<R: CartRepository>(outcome: PaymentOutcome, cart: &mut CartStore<R>) {
    if outcome != PaymentOutcome::Paid {
        return;
    }
    if let Err(e) = cart.clear_cart().await {
        tracing::warn!(error = %e, "failed to clear cart after payment");
    }
}

/// Aligns local order state with the payment provider's outcome.
pub struct Reconciler<'a, S: SessionSource> {
    sessions: &'a S,
    pool: &'a PgPool,
}

impl<'a, S: SessionSource> Reconciler<'a, S> {
    /// Create a reconciler over a session source and database pool.
    #[must_use]
    pub const fn new(sessions: &'a S, pool: &'a PgPool) -> Self {
        Self { sessions, pool }
    }

    /// Resolve a returned session: fetch it, map its status, mirror the
    /// result into the order record, and settle the cart.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::SessionNotFound` if the session id is
    /// unknown, or `ReconcileError::Payments` if the provider cannot be
    /// queried. Order-update failures never surface.
    #[instrument(skip(self, cart))]
    pub async fn resolve<R: CartRepository>(
        &self,
        session_id: &str,
        cart: &mut CartStore<R>,
    ) -> Result<ReconcileResult, ReconcileError> {
        let details = self
            .sessions
            .fetch_session(session_id)
            .await
            .map_err(|e| match e {
                PaymentsError::SessionNotFound(id) => ReconcileError::SessionNotFound(id),
                other => ReconcileError::Payments(other),
            })?;

        let outcome = map_intent_status(details.intent_status.as_deref());

        self.persist_outcome(&details, outcome).await;
        settle_cart(outcome, cart).await;

        Ok(ReconcileResult {
            outcome,
            order_id: details.order_id,
            payment_method: details.payment_method,
        })
    }

    /// Best-effort mirror of the outcome into the order record.
    async fn persist_outcome(&self, details: &SessionDetails, outcome: PaymentOutcome) {
        let Some(order_id) = details.order_id else {
            tracing::debug!(session_id = %details.id, "session carries no order id");
            return;
        };
        let Some(status) = outcome.as_order_status() else {
            return;
        };

        let result = OrderRepository::new(self.pool)
            .update_status(order_id, status, details.payment_method.as_deref())
            .await;

        if let Err(e) = result {
            tracing::warn!(
                %order_id,
                status = %status,
                error = %e,
                "failed to mirror payment outcome into order"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{InMemoryCartRepository, LineItem, Namespace};
    use mangaba_core::{Money, ProductId};

    #[test]
    fn test_map_intent_status() {
        assert_eq!(map_intent_status(Some("succeeded")), PaymentOutcome::Paid);
        assert_eq!(map_intent_status(Some("canceled")), PaymentOutcome::Canceled);
        assert_eq!(
            map_intent_status(Some("requires_payment_method")),
            PaymentOutcome::Canceled
        );
        assert_eq!(map_intent_status(None), PaymentOutcome::Unknown);
    }

    async fn cart_with_item(
        repo: &InMemoryCartRepository,
    ) -> CartStore<InMemoryCartRepository> {
        let mut cart = CartStore::open(repo.clone(), Namespace::Guest).await.unwrap();
        cart.add_item(LineItem {
            product_id: ProductId::from("prod_a"),
            name: "Product A".to_owned(),
            unit_price: Money::from_minor_units(1000),
            image: None,
            quantity: 1,
        })
        .await
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_settle_cart_clears_on_paid() {
        let repo = InMemoryCartRepository::new();
        let mut cart = cart_with_item(&repo).await;

        settle_cart(PaymentOutcome::Paid, &mut cart).await;

        assert!(cart.is_empty());
        assert_eq!(repo.persisted("cart-guest"), None);
    }

    #[tokio::test]
    async fn test_settle_cart_leaves_cart_on_other_outcomes() {
        let repo = InMemoryCartRepository::new();
        let mut cart = cart_with_item(&repo).await;

        settle_cart(PaymentOutcome::Canceled, &mut cart).await;
        settle_cart(PaymentOutcome::Unknown, &mut cart).await;
        settle_cart(PaymentOutcome::Unauthorized, &mut cart).await;

        assert_eq!(cart.items().len(), 1);
        assert!(repo.persisted("cart-guest").is_some());
    }
}

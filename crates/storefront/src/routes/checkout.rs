//! Checkout route handlers.
//!
//! The in-progress checkout (address form, freight quote, selection) lives
//! in the session as a [`QuoteState`]; the cart lives in its namespace
//! store. Submission hands off to the hosted payment page, and the result
//! handler reconciles the returned session.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use mangaba_core::{OrderId, PaymentOutcome};

use crate::checkout::{CheckoutRequest, CheckoutService};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::session_keys;
use crate::reconcile::Reconciler;
use crate::routes::cart::open_cart;
use crate::services::postal::PostalClient;
use crate::shipping::{AddressForm, FreightOption, QuoteState, ShippingEstimator};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the quote state from the session (default empty).
async fn get_quote_state(session: &Session) -> Result<QuoteState> {
    session
        .get::<QuoteState>(session_keys::QUOTE_STATE)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| AppError::Internal(format!("session read failed: {e}")))
}

/// Store the quote state in the session.
async fn set_quote_state(session: &Session, quote: &QuoteState) -> Result<()> {
    session
        .insert(session_keys::QUOTE_STATE, quote)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
}

// =============================================================================
// Address
// =============================================================================

/// Address validation response.
#[derive(Debug, serde::Serialize)]
pub struct AddressValidationView {
    pub valid: bool,
    pub errors: BTreeMap<&'static str, String>,
    /// Whether a previously held freight quote was invalidated by this edit.
    pub quote_invalidated: bool,
}

/// Save the checkout address form.
///
/// Validation runs on every save, not only on submit. Any change to the
/// address drops a previously computed freight quote and selection.
#[instrument(skip(session, form))]
pub async fn save_address(
    session: Session,
    Json(form): Json<AddressForm>,
) -> Result<Json<AddressValidationView>> {
    let mut quote = get_quote_state(&session).await?;
    let had_quote = quote.has_quote();

    quote.set_address(form);
    let errors = quote.address.validate();
    let quote_invalidated = had_quote && !quote.has_quote();

    set_quote_state(&session, &quote).await?;

    Ok(Json(AddressValidationView {
        valid: errors.is_empty(),
        errors,
        quote_invalidated,
    }))
}

// =============================================================================
// Freight
// =============================================================================

/// Freight quote response.
#[derive(Debug, serde::Serialize)]
pub struct FreightQuoteView {
    pub options: Vec<FreightOption>,
}

/// Compute freight options for the saved address.
///
/// Backfills blank address fields from the postal lookup (shopper input
/// wins) and stores the fresh quote; any previous selection is discarded.
#[instrument(skip(state, session))]
pub async fn quote_freight(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FreightQuoteView>> {
    let mut quote = get_quote_state(&session).await?;

    let estimator: ShippingEstimator<PostalClient> =
        ShippingEstimator::new(state.postal().clone());
    let options = estimator.compute_freight(&mut quote.address).await?;

    quote.record_options(options.clone());
    set_quote_state(&session, &quote).await?;

    Ok(Json(FreightQuoteView { options }))
}

/// Freight selection request body.
#[derive(Debug, Deserialize)]
pub struct SelectFreightRequest {
    /// Index into the last quoted options.
    pub index: usize,
}

/// Freight selection response.
#[derive(Debug, serde::Serialize)]
pub struct FreightSelectionView {
    pub selected: FreightOption,
}

/// Select one of the quoted freight options.
#[instrument(skip(session, request))]
pub async fn select_freight(
    session: Session,
    Json(request): Json<SelectFreightRequest>,
) -> Result<Json<FreightSelectionView>> {
    let mut quote = get_quote_state(&session).await?;

    let selected = quote.select(request.index).map(Clone::clone);
    // Persist even on failure: a failed select clears the stored selection.
    set_quote_state(&session, &quote).await?;
    let selected = selected?;

    Ok(Json(FreightSelectionView { selected }))
}

// =============================================================================
// Submit
// =============================================================================

/// Checkout submission response: where to send the shopper.
#[derive(Debug, serde::Serialize)]
pub struct CheckoutRedirectView {
    pub order_id: OrderId,
    pub url: String,
}

/// Submit the checkout.
///
/// Requires a non-empty cart, a valid address, a selected freight option,
/// and an authenticated shopper. On success the created order id and the
/// hosted payment page URL are returned for redirect.
#[instrument(skip(state, session, auth))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CheckoutRedirectView>> {
    let RequireAuth(user) = auth;
    let cart = open_cart(&state, Some(&user)).await?;
    let quote = get_quote_state(&session).await?;

    let service = CheckoutService::new(state.pool(), state.payments(), &state.config().base_url);
    let redirect = service
        .submit(CheckoutRequest {
            identity: Some(user.id),
            items: cart.items(),
            address: &quote.address,
            freight: quote.selected_option(),
        })
        .await?;

    Ok(Json(CheckoutRedirectView {
        order_id: redirect.order_id,
        url: redirect.url,
    }))
}

// =============================================================================
// Result / reconciliation
// =============================================================================

/// Query parameters on return from the hosted payment page.
#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub session_id: String,
}

/// Reconcile a returned payment session.
///
/// Renders from the session's live status. An unauthenticated caller gets
/// the pass-through `unauthorized` status; the order record is never
/// touched in that case.
#[instrument(skip(state, session, auth), fields(session_id = %query.session_id))]
pub async fn result(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Query(query): Query<ResultQuery>,
) -> Result<Response> {
    let Some(user) = auth.0 else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": PaymentOutcome::Unauthorized})),
        )
            .into_response());
    };

    let mut cart = open_cart(&state, Some(&user)).await?;

    let reconciler = Reconciler::new(state.payments(), state.pool());
    let resolved = reconciler.resolve(&query.session_id, &mut cart).await?;

    // A paid outcome finished this checkout; drop the stale quote state.
    if resolved.outcome == PaymentOutcome::Paid {
        let _ = session.remove::<QuoteState>(session_keys::QUOTE_STATE).await;
    }

    Ok(Json(json!({
        "status": resolved.outcome,
        "order_id": resolved.order_id,
        "payment_method": resolved.payment_method,
    }))
    .into_response())
}

//! Account address route handlers.
//!
//! The profile's single address is normally written at checkout; these
//! endpoints let shoppers view and edit it between purchases. Order
//! history never changes with it - orders carry denormalized copies.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::shipping::AddressForm;
use crate::state::AppState;

use crate::db::addresses::AddressRepository;

/// Get the authenticated profile's saved address (null if none yet).
#[instrument(skip(state, auth))]
pub async fn show_address(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Option<Address>>> {
    let RequireAuth(user) = auth;
    let address = AddressRepository::new(state.pool())
        .get_for_profile(user.id)
        .await?;

    Ok(Json(address))
}

/// Replace the authenticated profile's address.
///
/// The same field rules as checkout apply: everything but `complement` is
/// required.
#[instrument(skip(state, auth, form))]
pub async fn save_address(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(form): Json<AddressForm>,
) -> Result<Json<Address>> {
    let RequireAuth(user) = auth;

    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let address = AddressRepository::new(state.pool())
        .upsert_for_profile(user.id, &form.to_new_address())
        .await?;

    Ok(Json(address))
}

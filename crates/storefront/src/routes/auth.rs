//! Authentication route handlers.
//!
//! Login and logout change the active identity, which changes the cart
//! namespace subsequent requests operate on. Guest and profile carts are
//! distinct namespaces and are never merged (the guest cart stays persisted
//! under its own key).

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mangaba_core::{Email, ProfileId};

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration / login request body.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated profile response.
#[derive(Debug, serde::Serialize)]
pub struct ProfileView {
    pub id: ProfileId,
    pub email: Email,
}

/// Register a new profile and log it in.
#[instrument(skip(state, session, request))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<ProfileView>> {
    let profile = AuthService::new(state.pool())
        .register(&request.email, &request.password)
        .await?;

    let user = CurrentUser {
        id: profile.id,
        email: profile.email.clone(),
    };
    set_current_user(&session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    crate::error::set_sentry_user(&profile.id, Some(profile.email.as_str()));

    Ok(Json(ProfileView {
        id: profile.id,
        email: profile.email,
    }))
}

/// Login with email and password.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<ProfileView>> {
    let profile = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    // Rotate the session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;

    let user = CurrentUser {
        id: profile.id,
        email: profile.email.clone(),
    };
    set_current_user(&session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    crate::error::set_sentry_user(&profile.id, Some(profile.email.as_str()));

    Ok(Json(ProfileView {
        id: profile.id,
        email: profile.email,
    }))
}

/// Logout the current profile.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
    crate::error::clear_sentry_user();

    Ok(Json(serde_json::json!({"logged_out": true})))
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` that captures server-side errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Validation errors carry a per-field map rendered
//! inline by the client; everything else becomes a generic message.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::db::RepositoryError;
use crate::reconcile::ReconcileError;
use crate::services::auth::AuthError;
use crate::services::payments::PaymentsError;
use crate::services::postal::PostalError;
use crate::shipping::ShippingError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Field-level validation failed; map of field name to message.
    #[error("validation failed")]
    Validation(BTreeMap<&'static str, String>),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payments provider operation failed.
    #[error("Payments error: {0}")]
    Payments(#[from] PaymentsError),

    /// Postal lookup failed.
    #[error("Postal lookup error: {0}")]
    Postal(#[from] PostalError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No authenticated identity on a flow that requires one.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but not allowed to touch the resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ShippingError> for AppError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::InvalidPostalCode(e) => {
                Self::Validation(BTreeMap::from([("postal_code", e.to_string())]))
            }
            ShippingError::IncompleteAddress(errors) => Self::Validation(errors),
            ShippingError::PostalCodeNotFound(code) => {
                Self::NotFound(format!("postal code {code}"))
            }
            ShippingError::Lookup(e) => Self::Postal(e),
            ShippingError::NoSuchOption(i) => Self::BadRequest(format!("no freight option {i}")),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Unauthenticated => Self::Unauthenticated,
            CheckoutError::EmptyCart => Self::BadRequest("cart is empty".to_owned()),
            CheckoutError::NoFreightSelected => {
                Self::BadRequest("no freight option selected".to_owned())
            }
            CheckoutError::InvalidAddress(errors) => Self::Validation(errors),
            CheckoutError::Repository(e) => Self::Database(e),
            CheckoutError::Payments(e) => Self::Payments(e),
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::SessionNotFound(id) => Self::NotFound(format!("session {id}")),
            ReconcileError::Payments(e) => Self::Payments(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Payments(_) | Self::Postal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payments(_) | Self::Postal(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::ProfileAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(errors) => json!({
                "error": "validation failed",
                "fields": errors,
            }),
            Self::Database(_) | Self::Internal(_) => json!({"error": "Internal server error"}),
            Self::Payments(_) | Self::Postal(_) => json!({"error": "External service error"}),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => json!({"error": "Invalid credentials"}),
                AuthError::ProfileAlreadyExists => {
                    json!({"error": "An account with this email already exists"})
                }
                AuthError::WeakPassword(msg) => json!({"error": msg}),
                AuthError::InvalidEmail(_) => json!({"error": "Invalid email address"}),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    json!({"error": "Internal server error"})
                }
            },
            other => json!({"error": other.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a profile ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(profile_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(profile_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product prod_123".to_string());
        assert_eq!(err.to_string(), "Not found: product prod_123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Validation(BTreeMap::from([(
                "city",
                "city is required".to_string()
            )]))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_shipping_error_conversion() {
        let err: AppError = ShippingError::PostalCodeNotFound("99999999".to_owned()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = ShippingError::NoSuchOption(9).into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_checkout_error_conversion() {
        let err: AppError = CheckoutError::Unauthenticated.into();
        assert!(matches!(err, AppError::Unauthenticated));

        let err: AppError = CheckoutError::EmptyCart.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

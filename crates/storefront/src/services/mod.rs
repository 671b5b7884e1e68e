//! External service clients and application services.
//!
//! - [`postal`] - Postal-code lookup client (address resolution)
//! - [`payments`] - Payments provider client (hosted checkout sessions)
//! - [`auth`] - Registration and login

pub mod auth;
pub mod payments;
pub mod postal;

//! Core types for Mangaba.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod postal;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use postal::{PostalCode, PostalCodeError};
pub use status::{OrderStatus, PaymentOutcome};

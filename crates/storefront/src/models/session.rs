//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use mangaba_core::{Email, ProfileId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in shopper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Profile's database ID.
    pub id: ProfileId,
    /// Profile's email address.
    pub email: Email,
}

/// Session keys for per-visitor state.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the in-progress checkout quote state (address + freight).
    pub const QUOTE_STATE: &str = "quote_state";
}

//! Shopper profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mangaba_core::{Email, ProfileId};

/// Role attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    /// Regular shopper.
    #[default]
    Customer,
    /// Back-office operator.
    Admin,
}

impl ProfileRole {
    /// The role as its database string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its database string, defaulting to `Customer`.
    #[must_use]
    pub fn from_db(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::Customer,
        }
    }
}

/// A shopper profile.
///
/// The password hash is deliberately not part of this struct; it is only
/// surfaced by the dedicated credential query in the profile repository.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub email: Email,
    pub role: ProfileRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

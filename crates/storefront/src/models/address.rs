//! Shipping address model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mangaba_core::{AddressId, ProfileId};

/// A profile's shipping address.
///
/// One row per profile, replaced wholesale at every checkout submission.
/// `complement` is the only optional field; everything else must be present
/// before freight can be computed or checkout finalized.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub profile_id: ProfileId,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub complement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a profile's address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub complement: Option<String>,
}

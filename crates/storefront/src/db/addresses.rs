//! Address repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mangaba_core::{AddressId, ProfileId};

use super::RepositoryError;
use crate::models::address::{Address, NewAddress};

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    profile_id: i32,
    postal_code: String,
    street: String,
    number: String,
    neighborhood: String,
    city: String,
    region: String,
    complement: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            profile_id: ProfileId::new(row.profile_id),
            postal_code: row.postal_code,
            street: row.street,
            number: row.number,
            neighborhood: row.neighborhood,
            city: row.city,
            region: row.region,
            complement: row.complement,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the address for a profile, if one has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            r"
            SELECT id, profile_id, postal_code, street, number, neighborhood,
                   city, region, complement, created_at, updated_at
            FROM addresses
            WHERE profile_id = $1
            ",
        )
        .bind(profile_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create or replace the address for a profile.
    ///
    /// Each profile holds exactly one address row; checkout replaces it
    /// wholesale with whatever the shopper submitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_for_profile(
        &self,
        profile_id: ProfileId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO addresses
                (profile_id, postal_code, street, number, neighborhood, city, region, complement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (profile_id) DO UPDATE SET
                postal_code = EXCLUDED.postal_code,
                street = EXCLUDED.street,
                number = EXCLUDED.number,
                neighborhood = EXCLUDED.neighborhood,
                city = EXCLUDED.city,
                region = EXCLUDED.region,
                complement = EXCLUDED.complement,
                updated_at = now()
            RETURNING id, profile_id, postal_code, street, number, neighborhood,
                      city, region, complement, created_at, updated_at
            ",
        )
        .bind(profile_id.as_i32())
        .bind(&address.postal_code)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.region)
        .bind(address.complement.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(Address::from(row))
    }
}

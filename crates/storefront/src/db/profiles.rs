//! Profile repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mangaba_core::{Email, ProfileId};

use super::RepositoryError;
use crate::models::profile::{Profile, ProfileRole};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for profile queries.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i32,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: ProfileId::new(row.id),
            email,
            role: ProfileRole::from_db(&row.role),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r"
            SELECT id, email, role, created_at, updated_at
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    /// Get a profile by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r"
            SELECT id, email, role, created_at, updated_at
            FROM profiles
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    /// Get a profile and its password hash by email, for login verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Profile, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CredentialRow {
            id: i32,
            email: String,
            role: String,
            password_hash: String,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
        }

        let row: Option<CredentialRow> = sqlx::query_as(
            r"
            SELECT id, email, role, password_hash, created_at, updated_at
            FROM profiles
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let hash = r.password_hash.clone();
                let profile = Profile::try_from(ProfileRow {
                    id: r.id,
                    email: r.email,
                    role: r.role,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                })?;
                Ok(Some((profile, hash)))
            }
            None => Ok(None),
        }
    }

    /// Create a new profile with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Profile, RepositoryError> {
        let row: ProfileRow = sqlx::query_as(
            r"
            INSERT INTO profiles (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, role, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Profile::try_from(row)
    }
}

//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use thiserror::Error;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required environment variable is not set.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running migrations failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A repository operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] mangaba_storefront::db::RepositoryError),
}

/// Resolve the storefront database URL from the environment.
///
/// Tries `STOREFRONT_DATABASE_URL` first, then the generic `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mangaba_core::{ProductId, ProfileId, ReviewId};

use super::RepositoryError;
use crate::models::review::{Review, ReviewSummary};

/// Internal row type for review queries.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: String,
    profile_id: i32,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            profile_id: ProfileId::new(row.profile_id),
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Repository for product review operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT id, product_id, profile_id, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(product_id.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Aggregate rating figures for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, product_id: &ProductId) -> Result<ReviewSummary, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct SummaryRow {
            average_rating: Option<f64>,
            review_count: i64,
        }

        let row: SummaryRow = sqlx::query_as(
            r"
            SELECT AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count
            FROM reviews
            WHERE product_id = $1
            ",
        )
        .bind(product_id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(ReviewSummary {
            average_rating: row.average_rating.unwrap_or(0.0),
            review_count: row.review_count,
        })
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product does not exist
    /// (foreign key violation). Returns `RepositoryError::Database` for
    /// other database errors.
    pub async fn insert(
        &self,
        product_id: &ProductId,
        profile_id: ProfileId,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            INSERT INTO reviews (product_id, profile_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, profile_id, rating, comment, created_at
            ",
        )
        .bind(product_id.as_str())
        .bind(profile_id.as_i32())
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("product does not exist".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(Review::from(row))
    }
}

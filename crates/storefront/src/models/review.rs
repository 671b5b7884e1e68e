//! Product review models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mangaba_core::{ProductId, ProfileId, ReviewId};

/// A product review left by a shopper.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub profile_id: ProfileId,
    /// Star rating, 1 through 5.
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate review figures for a product.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct ReviewSummary {
    /// Mean rating over all reviews, 0.0 when there are none.
    pub average_rating: f64,
    pub review_count: i64,
}

//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use mangaba_core::ProductId;

use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Review, ReviewSummary};
use crate::state::AppState;

/// Reviews listing response: entries plus the aggregate summary.
#[derive(Debug, serde::Serialize)]
pub struct ReviewListView {
    pub reviews: Vec<Review>,
    pub summary: ReviewSummary,
}

/// List a product's reviews with the aggregate rating.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ReviewListView>> {
    let repository = ReviewRepository::new(state.pool());
    let reviews = repository.list_for_product(&product_id).await?;
    let summary = repository.summary(&product_id).await?;

    Ok(Json(ReviewListView { reviews, summary }))
}

/// Review creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Star rating, 1 through 5.
    pub rating: i16,
    pub comment: Option<String>,
}

/// Create a review for a product (requires auth).
#[instrument(skip(state, auth, request))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Review>> {
    let RequireAuth(user) = auth;

    if !(1..=5).contains(&request.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_owned(),
        ));
    }

    state
        .catalog()
        .get(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let review = ReviewRepository::new(state.pool())
        .insert(
            &product_id,
            user.id,
            request.rating,
            request.comment.as_deref(),
        )
        .await?;

    Ok(Json(review))
}

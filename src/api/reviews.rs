//! Review and favorite endpoints
//!
//! - GET /api/v1/reviews/{productType}/{productId} - Approved reviews
//! - POST /api/v1/reviews - Submit a review
//! - GET /api/v1/reviews?status= - Moderation list (admin)
//! - PATCH /api/v1/reviews/{id}/status - Approve or reject (admin)
//! - GET /api/v1/favorites/all - The caller's favorites
//! - POST /api/v1/favorites - Toggle a favorite
//! - DELETE /api/v1/favorites/{id} - Remove a favorite

use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::{default_limit, default_page, ApiJson, ApiQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{
    CreateReviewInput, Favorite, ListParams, ProductType, Review, ReviewStatus, ReviewSummary,
    ToggleFavoriteInput,
};
use crate::services::FavoriteToggle;

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub status: Option<ReviewStatus>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReviewStatusRequest {
    pub status: ReviewStatus,
}

// The first segment is a product type on the public route and a review id
// on the moderation route, so both share one parameter name.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/reviews/{key}/{product_id}", get(product_reviews))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/favorites/all", get(list_favorites))
        .route("/favorites", post(toggle_favorite))
        .route("/favorites/{id}", delete(delete_favorite))
}

/// Admin-only routes; the caller is checked by `require_admin`
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/{key}/status", patch(moderate_review))
}

async fn product_reviews(
    State(state): State<AppState>,
    Path((product_type, product_id)): Path<(ProductType, i64)>,
) -> Result<ApiResponse<ReviewSummary>, ApiError> {
    let summary = state.review_service.summary(product_type, product_id).await?;
    Ok(ApiResponse::ok(summary))
}

async fn create_review(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateReviewInput>,
) -> Result<ApiResponse<Review>, ApiError> {
    let review = state.review_service.create(&user, input).await?;
    Ok(ApiResponse::created(review).with_message("Review submitted for approval"))
}

async fn list_reviews(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiQuery(query): ApiQuery<ReviewListQuery>,
) -> Result<ApiResponse<Vec<Review>>, ApiError> {
    let page = state
        .review_service
        .list(&user, query.status, &ListParams::new(query.page, query.limit))
        .await?;
    Ok(ApiResponse::paged(page))
}

async fn moderate_review(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<ReviewStatusRequest>,
) -> Result<ApiResponse<Review>, ApiError> {
    let review = state.review_service.moderate(&user, id, body.status).await?;
    Ok(ApiResponse::ok(review).with_message("Review updated"))
}

async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<ApiResponse<Vec<Favorite>>, ApiError> {
    let favorites = state.favorite_service.list(&user).await?;
    Ok(ApiResponse::ok(favorites))
}

async fn toggle_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<ToggleFavoriteInput>,
) -> Result<ApiResponse<FavoriteToggle>, ApiError> {
    let toggle = state.favorite_service.toggle(&user, input).await?;
    Ok(ApiResponse::ok(toggle))
}

async fn delete_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.favorite_service.delete(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Favorite removed"))
}

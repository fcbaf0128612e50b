//! Category API endpoints
//!
//! - GET /api/v1/categories?kind= - List categories
//! - POST /api/v1/categories - Create a category (admin)
//! - DELETE /api/v1/categories/{id} - Delete a category (admin)

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;

use crate::api::common::{ApiJson, ApiQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ApiResponse;
use crate::models::{Category, CategoryKind, CreateCategoryInput};

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub kind: Option<CategoryKind>,
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/{id}", delete(delete_category))
}

async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<ApiResponse<Vec<Category>>, ApiError> {
    let categories = state.category_service.list(query.kind).await?;
    Ok(ApiResponse::ok(categories))
}

async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCategoryInput>,
) -> Result<ApiResponse<Category>, ApiError> {
    let category = state.category_service.create(input).await?;
    Ok(ApiResponse::created(category).with_message("Category created"))
}

/// Courses, blogs and products in this category are kept uncategorized
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.category_service.delete(id).await?;
    Ok(ApiResponse::ok(()).with_message("Category deleted"))
}

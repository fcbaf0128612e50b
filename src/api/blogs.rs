//! Blog and comment endpoints
//!
//! - GET /api/v1/blogs - Paginated list, filterable by tag
//! - GET /api/v1/blogs/{id} - Detail; counts a view
//! - POST/PATCH/DELETE /api/v1/blogs[/{id}] - Manage posts
//! - GET/POST /api/v1/blogs/{id}/comments - Read and write comments
//! - DELETE /api/v1/comments/{id} - Remove a comment

use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Router,
};

use crate::api::common::{ApiJson, ApiQuery, CatalogQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, Viewer};
use crate::api::responses::ApiResponse;
use crate::models::{Blog, BlogComment, CreateBlogInput, CreateCommentInput, UpdateBlogInput};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/{id}", get(get_blog))
        .route("/blogs/{id}/comments", get(list_comments))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/blogs/{id}", patch(update_blog).delete(delete_blog))
        .route("/blogs/{id}/comments", post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
}

/// Mentor or admin routes
pub fn staff_router() -> Router<AppState> {
    Router::new().route("/blogs", post(create_blog))
}

async fn list_blogs(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<ApiResponse<Vec<Blog>>, ApiError> {
    let (filter, params) = query.into_parts();
    let page = state.blog_service.list(filter, &params, viewer.user()).await?;
    Ok(ApiResponse::paged(page))
}

async fn get_blog(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Blog>, ApiError> {
    let blog = state.blog_service.view(id, viewer.user()).await?;
    Ok(ApiResponse::ok(blog))
}

async fn create_blog(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateBlogInput>,
) -> Result<ApiResponse<Blog>, ApiError> {
    let blog = state.blog_service.create(&user, input).await?;
    Ok(ApiResponse::created(blog).with_message("Blog created"))
}

async fn update_blog(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateBlogInput>,
) -> Result<ApiResponse<Blog>, ApiError> {
    let blog = state.blog_service.update(&user, id, input).await?;
    Ok(ApiResponse::ok(blog).with_message("Blog updated"))
}

async fn delete_blog(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.blog_service.delete(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Blog deleted"))
}

/// Oldest first
async fn list_comments(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Vec<BlogComment>>, ApiError> {
    let comments = state.blog_service.comments(id, viewer.user()).await?;
    Ok(ApiResponse::ok(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<CreateCommentInput>,
) -> Result<ApiResponse<BlogComment>, ApiError> {
    let comment = state.blog_service.add_comment(&user, id, &input.content).await?;
    Ok(ApiResponse::created(comment).with_message("Comment added"))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.blog_service.delete_comment(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Comment deleted"))
}

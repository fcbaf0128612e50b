//! User administration endpoints
//!
//! - GET /api/v1/users - Paginated user list
//! - PATCH /api/v1/users/{id}/role - Change a user's role
//! - PATCH /api/v1/users/{id}/status - Block or unblock a user

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Router,
};
use serde::Deserialize;

use crate::api::common::{ApiJson, ApiQuery, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{User, UserRole, UserStatus};

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: UserStatus,
}

/// Admin-only routes; the caller is checked by `require_admin`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}/role", patch(update_role))
        .route("/{id}/status", patch(update_status))
}

async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PaginationQuery>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let page = state.user_service.list(&query.params()).await?;
    Ok(ApiResponse::paged(page))
}

async fn update_role(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<RoleRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    if admin.id == id && body.role != UserRole::Admin {
        return Err(ApiError::bad_request("You cannot remove your own admin role"));
    }
    let user = state.user_service.set_role(id, body.role).await?;
    Ok(ApiResponse::ok(user).with_message("Role updated"))
}

async fn update_status(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    if admin.id == id && body.status == UserStatus::Blocked {
        return Err(ApiError::bad_request("You cannot block yourself"));
    }
    let user = state.user_service.set_status(id, body.status).await?;
    Ok(ApiResponse::ok(user).with_message("Status updated"))
}

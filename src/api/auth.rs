//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/v1/auth/register - User registration
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::api::common::ApiJson;
use crate::api::middleware::{bearer_token, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{AuthPayload, LoginInput, RegisterInput, User};

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /api/v1/auth/register - Create an account and sign in
///
/// The first account ever registered becomes an admin.
async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<ApiResponse<AuthPayload>, ApiError> {
    let payload = state.user_service.register(input).await?;
    Ok(ApiResponse::created(payload).with_message("User registered successfully"))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<ApiResponse<AuthPayload>, ApiError> {
    let payload = state.user_service.login(input).await?;
    Ok(ApiResponse::ok(payload).with_message("User logged in successfully"))
}

/// POST /api/v1/auth/logout - Delete the current session
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<ApiResponse<()>, ApiError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;
    state.user_service.logout(&token).await?;
    Ok(ApiResponse::ok(()).with_message("Logged out"))
}

/// GET /api/v1/auth/me - Get current user
async fn get_current_user(user: AuthenticatedUser) -> ApiResponse<User> {
    ApiResponse::ok(user.0)
}

//! API middleware
//!
//! Contains middleware for:
//! - Authentication (Bearer session token validation)
//! - Authorization (admin and staff checks)
//!
//! plus the shared application state and the error envelope.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::cache::Cache;
use crate::db::repositories::{
    SqlxBlogRepository, SqlxCategoryRepository, SqlxCommentRepository, SqlxCourseModuleRepository,
    SqlxCourseRepository, SqlxFavoriteRepository, SqlxLessonRepository, SqlxProductRepository,
    SqlxProgressRepository, SqlxReviewRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    BlogService, CategoryService, CourseService, CurriculumService, FavoriteService, FieldError,
    ProductLookup, ProductService, ProgressService, ReviewService, ServiceError, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub category_service: Arc<CategoryService>,
    pub course_service: Arc<CourseService>,
    pub curriculum_service: Arc<CurriculumService>,
    pub progress_service: Arc<ProgressService>,
    pub blog_service: Arc<BlogService>,
    pub product_service: Arc<ProductService>,
    pub review_service: Arc<ReviewService>,
    pub favorite_service: Arc<FavoriteService>,
}

impl AppState {
    /// Wire every repository and service over one pool and cache
    pub fn new(pool: DynDatabasePool, cache: Arc<Cache>, session_days: i64) -> Self {
        let users = SqlxUserRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let courses = SqlxCourseRepository::boxed(pool.clone());
        let modules = SqlxCourseModuleRepository::boxed(pool.clone());
        let lessons = SqlxLessonRepository::boxed(pool.clone());
        let progress = SqlxProgressRepository::boxed(pool.clone());
        let blogs = SqlxBlogRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let products = SqlxProductRepository::boxed(pool.clone());
        let reviews = SqlxReviewRepository::boxed(pool.clone());
        let favorites = SqlxFavoriteRepository::boxed(pool.clone());

        let lookup = ProductLookup::new(courses.clone(), products.clone());

        Self {
            user_service: Arc::new(UserService::with_session_days(users, sessions, session_days)),
            category_service: Arc::new(CategoryService::new(categories.clone())),
            course_service: Arc::new(CourseService::new(
                courses.clone(),
                modules.clone(),
                lessons.clone(),
                progress.clone(),
                categories.clone(),
                cache.clone(),
            )),
            curriculum_service: Arc::new(CurriculumService::new(
                courses.clone(),
                modules,
                lessons.clone(),
                cache,
            )),
            progress_service: Arc::new(ProgressService::new(courses, lessons, progress)),
            blog_service: Arc::new(BlogService::new(blogs, comments, categories.clone())),
            product_service: Arc::new(ProductService::new(products, categories)),
            review_service: Arc::new(ReviewService::new(reviews, lookup.clone())),
            favorite_service: Arc::new(FavoriteService::new(favorites, lookup)),
            pool,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// The caller, when a valid token was sent
///
/// Only populated on routes behind [`optional_auth`] or [`require_auth`].
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|authenticated| authenticated.0.clone()),
        ))
    }
}

/// Error response for API errors
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    error_messages: &'a [FieldError],
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            errors: vec![FieldError::new("", message.clone())],
            message,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation error".to_string(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Logs the cause and hides it from the caller
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {:#}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: &self.message,
            error_messages: &self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::not_found(err.to_string()),
            ServiceError::Validation(errors) => ApiError::validation(errors),
            ServiceError::Forbidden(message) => ApiError::forbidden(message),
            ServiceError::Conflict(message) => ApiError::conflict(message),
            ServiceError::Internal(cause) => ApiError::internal_error(cause),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(message) => ApiError::unauthorized(message),
            UserServiceError::Blocked => ApiError::forbidden(err.to_string()),
            UserServiceError::Validation(errors) => ApiError::validation(errors),
            UserServiceError::UserExists(message) => ApiError::conflict(message),
            UserServiceError::NotFound => ApiError::not_found(err.to_string()),
            UserServiceError::Internal(cause) => ApiError::internal_error(cause),
        }
    }
}

/// Extract the Bearer token from the Authorization header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// A missing or stale token leaves the request anonymous.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session lookup failed: {}", e),
        }
    }
    next.run(request).await
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Mentor or admin authorization middleware
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_staff() {
        return Err(ApiError::forbidden("Mentor or admin privileges required"));
    }

    Ok(next.run(request).await)
}

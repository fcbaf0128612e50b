//! Course API endpoints
//!
//! Handles the course catalog, the learner content bundle and progress:
//! - GET /api/v1/courses - Paginated course list
//! - GET /api/v1/courses/{id} - Course detail with curriculum counts
//! - GET /api/v1/courses/{id}/content - Course content bundle
//! - POST /api/v1/courses - Create (mentor/admin)
//! - PATCH /api/v1/courses/{id} - Update (owner/admin)
//! - DELETE /api/v1/courses/{id} - Delete (owner/admin)
//! - POST/GET /api/v1/courses/{id}/progress - Learner progress

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Router,
};

use crate::api::common::{ApiJson, ApiQuery, CatalogQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, Viewer};
use crate::api::responses::ApiResponse;
use crate::models::{
    CompleteLessonInput, Course, CourseContent, CourseDetail, CourseProgress, CreateCourseInput,
    UpdateCourseInput,
};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/{id}", get(get_course))
        .route("/{id}/content", get(get_course_content))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(update_course).delete(delete_course))
        .route("/{id}/progress", get(get_progress).post(complete_lesson))
}

/// Mentor or admin routes
pub fn staff_router() -> Router<AppState> {
    Router::new().route("/", post(create_course))
}

async fn list_courses(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<ApiResponse<Vec<Course>>, ApiError> {
    let (filter, params) = query.into_parts();
    let page = state.course_service.list(filter, &params, viewer.user()).await?;
    Ok(ApiResponse::paged(page))
}

async fn get_course(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CourseDetail>, ApiError> {
    let detail = state.course_service.detail(id, viewer.user()).await?;
    Ok(ApiResponse::ok(detail))
}

/// Modules, lessons and the grouped curriculum, plus the caller's
/// completed lessons when signed in
async fn get_course_content(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CourseContent>, ApiError> {
    let content = state.course_service.content(id, viewer.user()).await?;
    Ok(ApiResponse::ok(content))
}

async fn create_course(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateCourseInput>,
) -> Result<ApiResponse<Course>, ApiError> {
    let course = state.course_service.create(&user, input).await?;
    Ok(ApiResponse::created(course).with_message("Course created"))
}

async fn update_course(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateCourseInput>,
) -> Result<ApiResponse<Course>, ApiError> {
    let course = state.course_service.update(&user, id, input).await?;
    Ok(ApiResponse::ok(course).with_message("Course updated"))
}

async fn delete_course(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.course_service.delete(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Course deleted"))
}

async fn complete_lesson(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<CompleteLessonInput>,
) -> Result<ApiResponse<CourseProgress>, ApiError> {
    let progress = state
        .progress_service
        .complete_lesson(&user, id, input.lesson_id)
        .await?;
    Ok(ApiResponse::ok(progress))
}

async fn get_progress(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CourseProgress>, ApiError> {
    let progress = state.progress_service.progress(&user, id).await?;
    Ok(ApiResponse::ok(progress))
}

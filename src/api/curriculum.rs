//! Module and lesson endpoints
//!
//! Writes are limited to the course owner or an admin; the service checks
//! ownership against the parent course.

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Router,
};

use crate::api::common::ApiJson;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, Viewer};
use crate::api::responses::ApiResponse;
use crate::models::{
    CourseModule, CreateLessonInput, CreateModuleInput, Lesson, UpdateLessonInput,
    UpdateModuleInput,
};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/lessons/{id}", get(get_lesson))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/modules", post(create_module))
        .route("/modules/{id}", patch(update_module).delete(delete_module))
        .route("/lessons", post(create_lesson))
        .route("/lessons/{id}", patch(update_lesson).delete(delete_lesson))
}

async fn create_module(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateModuleInput>,
) -> Result<ApiResponse<CourseModule>, ApiError> {
    let module = state.curriculum_service.create_module(&user, input).await?;
    Ok(ApiResponse::created(module).with_message("Module created"))
}

async fn update_module(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateModuleInput>,
) -> Result<ApiResponse<CourseModule>, ApiError> {
    let module = state.curriculum_service.update_module(&user, id, input).await?;
    Ok(ApiResponse::ok(module).with_message("Module updated"))
}

/// Deletes the module's lessons too
async fn delete_module(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.curriculum_service.delete_module(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Module deleted"))
}

async fn get_lesson(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let lesson = state.curriculum_service.get_lesson(id, viewer.user()).await?;
    Ok(ApiResponse::ok(lesson))
}

async fn create_lesson(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateLessonInput>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let lesson = state.curriculum_service.create_lesson(&user, input).await?;
    Ok(ApiResponse::created(lesson).with_message("Lesson created"))
}

async fn update_lesson(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateLessonInput>,
) -> Result<ApiResponse<Lesson>, ApiError> {
    let lesson = state.curriculum_service.update_lesson(&user, id, input).await?;
    Ok(ApiResponse::ok(lesson).with_message("Lesson updated"))
}

async fn delete_lesson(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.curriculum_service.delete_lesson(&user, id).await?;
    Ok(ApiResponse::ok(()).with_message("Lesson deleted"))
}

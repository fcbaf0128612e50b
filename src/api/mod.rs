//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1` and answer with the JSON envelope in
//! [`responses`]. Routes are grouped by the access they need:
//! - public routes, where a valid token is optional
//! - signed-in routes
//! - mentor or admin routes
//! - admin routes

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod common;
pub mod courses;
pub mod curriculum;
pub mod health;
pub mod middleware;
pub mod products;
pub mod responses;
pub mod reviews;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::models::ProductKind;

pub use middleware::{ApiError, AppState, AuthenticatedUser, Viewer};
pub use responses::{ApiResponse, PageMeta};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/users", users::router())
        .nest("/categories", categories::admin_router())
        .nest("/softwares", products::admin_router(ProductKind::Software))
        .nest("/websites", products::admin_router(ProductKind::Website))
        .merge(reviews::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Staff routes (need mentor or admin role)
    let staff_routes = Router::new()
        .nest("/courses", courses::staff_router())
        .merge(blogs::staff_router())
        .route_layer(axum_middleware::from_fn(middleware::require_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but no particular role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/courses", courses::protected_router())
        .merge(curriculum::protected_router())
        .merge(blogs::protected_router())
        .merge(reviews::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::public_router())
        .nest("/categories", categories::public_router())
        .nest("/courses", courses::public_router())
        .merge(curriculum::public_router())
        .merge(blogs::public_router())
        .nest("/softwares", products::public_router(ProductKind::Software))
        .nest("/websites", products::public_router(ProductKind::Website))
        .merge(reviews::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::optional_auth,
        ))
        .merge(admin_routes)
        .merge(staff_routes)
        .merge(protected_routes)
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let origin = match cors_origin.trim() {
        "*" | "" => AllowOrigin::any(),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin '{}', allowing any origin", origin);
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .fallback(not_found)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;

//! Software and website product endpoints
//!
//! Both catalogs share one set of handlers; the mount point fixes the
//! product kind:
//! - GET /api/v1/softwares, /api/v1/websites - Paginated lists
//! - GET /api/v1/softwares/{id}, /api/v1/websites/{id} - Detail
//! - POST/PATCH/DELETE - Manage products (admin)

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Router,
};

use crate::api::common::{ApiJson, ApiQuery, CatalogQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, Viewer};
use crate::api::responses::ApiResponse;
use crate::models::{CreateProductInput, Product, ProductKind, UpdateProductInput};

pub fn public_router(kind: ProductKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |state: State<AppState>, viewer: Viewer, query: ApiQuery<CatalogQuery>| {
                list_products(kind, state, viewer, query)
            }),
        )
        .route(
            "/{id}",
            get(move |state: State<AppState>, viewer: Viewer, id: Path<i64>| {
                get_product(kind, state, viewer, id)
            }),
        )
}

/// Admin-only routes; the caller is checked by `require_admin`
pub fn admin_router(kind: ProductKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(
                move |state: State<AppState>, user: AuthenticatedUser, input: ApiJson<CreateProductInput>| {
                    create_product(kind, state, user, input)
                },
            ),
        )
        .route(
            "/{id}",
            patch(
                move |state: State<AppState>,
                      user: AuthenticatedUser,
                      id: Path<i64>,
                      input: ApiJson<UpdateProductInput>| {
                    update_product(kind, state, user, id, input)
                },
            )
            .delete(move |state: State<AppState>, user: AuthenticatedUser, id: Path<i64>| {
                delete_product(kind, state, user, id)
            }),
        )
}

async fn list_products(
    kind: ProductKind,
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<ApiResponse<Vec<Product>>, ApiError> {
    let (filter, params) = query.into_parts();
    let page = state
        .product_service
        .list(kind, filter, &params, viewer.user())
        .await?;
    Ok(ApiResponse::paged(page))
}

async fn get_product(
    kind: ProductKind,
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.product_service.get(kind, id, viewer.user()).await?;
    Ok(ApiResponse::ok(product))
}

async fn create_product(
    kind: ProductKind,
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateProductInput>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.product_service.create(&user, kind, input).await?;
    Ok(ApiResponse::created(product).with_message("Product created"))
}

async fn update_product(
    kind: ProductKind,
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<UpdateProductInput>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.product_service.update(&user, kind, id, input).await?;
    Ok(ApiResponse::ok(product).with_message("Product updated"))
}

async fn delete_product(
    kind: ProductKind,
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.product_service.delete(&user, kind, id).await?;
    Ok(ApiResponse::ok(()).with_message("Product deleted"))
}

//! Common API utilities and shared types

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::middleware::ApiError;
use crate::models::{CatalogFilter, ListParams, PublishStatus, SortOrder};

// ============================================================================
// Extractors
// ============================================================================

/// JSON body whose rejections use the error envelope
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Query string whose rejections use the error envelope
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

// ============================================================================
// Pagination and filtering
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_limit() -> u32 {
    10
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.limit)
    }
}

/// Query parameters accepted by catalog lists
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    /// Category id
    pub category: Option<i64>,
    pub featured: Option<bool>,
    pub popular: Option<bool>,
    pub status: Option<PublishStatus>,
    pub tag: Option<String>,
}

impl CatalogQuery {
    pub fn into_parts(self) -> (CatalogFilter, ListParams) {
        let params = ListParams::new(self.page, self.limit);
        let filter = CatalogFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort: self.sort,
            category_id: self.category,
            featured: self.featured,
            popular: self.popular,
            status: self.status,
            tag: self.tag.filter(|t| !t.trim().is_empty()),
            owner_id: None,
        };
        (filter, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_query_defaults() {
        let query: CatalogQuery = serde_json::from_str("{}").unwrap();
        let (filter, params) = query.into_parts();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(filter.sort, SortOrder::Newest);
        assert!(filter.status.is_none());
    }

    #[test]
    fn test_catalog_query_clamps_and_drops_blank_search() {
        let query: CatalogQuery = serde_json::from_value(serde_json::json!({
            "page": 0,
            "limit": 500,
            "search": "  ",
            "sort": "price_desc",
            "featured": true
        }))
        .unwrap();
        let (filter, params) = query.into_parts();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 100);
        assert!(filter.search.is_none());
        assert_eq!(filter.sort, SortOrder::PriceDesc);
        assert_eq!(filter.featured, Some(true));
    }
}

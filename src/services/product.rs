//! Product service for software and website listings
//!
//! Products are managed by admins only. Each call names the product kind,
//! so a software id never resolves on the website routes.

use crate::db::repositories::{CategoryRepository, ProductRepository};
use crate::models::{
    CatalogFilter, CreateProductInput, ListParams, PagedResult, Product, ProductKind,
    PublishStatus, UpdateProductInput, User,
};
use crate::services::course::scope_filter;
use crate::services::error::{resolve_slug, ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

/// Unpublished products are listed for admins only
fn scope_product_filter(mut filter: CatalogFilter, viewer: Option<&User>) -> CatalogFilter {
    if !viewer.is_some_and(User::is_admin) {
        filter.status = Some(PublishStatus::Published);
    }
    scope_filter(filter, viewer)
}

fn require_admin(user: &User) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Only admins can manage products".to_string()))
    }
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { products, categories }
    }

    async fn product(&self, kind: ProductKind, id: i64) -> Result<Product, ServiceError> {
        self.products
            .get_by_kind(kind, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(kind_label(kind)))
    }

    pub async fn list(
        &self,
        kind: ProductKind,
        filter: CatalogFilter,
        params: &ListParams,
        viewer: Option<&User>,
    ) -> Result<PagedResult<Product>, ServiceError> {
        let filter = scope_product_filter(filter, viewer);
        let (items, total) = self.products.list(kind, &filter, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, kind: ProductKind, id: i64, viewer: Option<&User>) -> Result<Product, ServiceError> {
        let product = self.product(kind, id).await?;
        if product.status != PublishStatus::Published && !viewer.is_some_and(User::is_admin) {
            return Err(ServiceError::not_found(kind_label(kind)));
        }
        Ok(product)
    }

    /// Whether a published product of this kind exists
    pub async fn exists(&self, kind: ProductKind, id: i64) -> Result<bool, ServiceError> {
        Ok(self
            .products
            .get_by_kind(kind, id)
            .await?
            .is_some_and(|p| p.status == PublishStatus::Published))
    }

    pub async fn create(
        &self,
        user: &User,
        kind: ProductKind,
        input: CreateProductInput,
    ) -> Result<Product, ServiceError> {
        require_admin(user)?;

        Validator::new()
            .required(&input.title, "title")
            .price(input.price, input.discount_price)
            .finish()?;

        let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
        if self.products.exists_by_slug(&slug).await? {
            return Err(ServiceError::Conflict(format!("Product slug '{}' already exists", slug)));
        }
        self.check_category(input.category_id).await?;

        let now = Utc::now();
        let product = self
            .products
            .create(&Product {
                id: 0,
                kind,
                slug,
                title: input.title.trim().to_string(),
                title_bn: input.title_bn,
                description: input.description,
                thumbnail: input.thumbnail,
                price: input.price,
                discount_price: input.discount_price,
                preview_url: input.preview_url,
                status: input.status,
                is_featured: input.is_featured,
                is_popular: input.is_popular,
                category_id: input.category_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(product_id = product.id, kind = %kind, "Product created");
        Ok(product)
    }

    pub async fn update(
        &self,
        user: &User,
        kind: ProductKind,
        id: i64,
        input: UpdateProductInput,
    ) -> Result<Product, ServiceError> {
        require_admin(user)?;
        let mut product = self.product(kind, id).await?;

        let mut validator = Validator::new();
        if let Some(title) = &input.title {
            validator.required(title, "title");
        }
        let price = input.price.unwrap_or(product.price);
        let discount = input.discount_price.unwrap_or(product.discount_price);
        validator.price(price, discount).finish()?;

        if let Some(slug) = input.slug.as_deref() {
            let slug = resolve_slug(Some(slug), &product.title)?;
            if slug != product.slug && self.products.exists_by_slug(&slug).await? {
                return Err(ServiceError::Conflict(format!("Product slug '{}' already exists", slug)));
            }
            product.slug = slug;
        }
        if let Some(category_id) = input.category_id {
            self.check_category(category_id).await?;
            product.category_id = category_id;
        }
        if let Some(title) = input.title {
            product.title = title.trim().to_string();
        }
        if input.title_bn.is_some() {
            product.title_bn = input.title_bn;
        }
        if let Some(description) = input.description {
            product.description = description;
        }
        if input.thumbnail.is_some() {
            product.thumbnail = input.thumbnail;
        }
        if input.preview_url.is_some() {
            product.preview_url = input.preview_url;
        }
        product.price = price;
        product.discount_price = discount;
        if let Some(status) = input.status {
            product.status = status;
        }
        if let Some(featured) = input.is_featured {
            product.is_featured = featured;
        }
        if let Some(popular) = input.is_popular {
            product.is_popular = popular;
        }

        Ok(self.products.update(&product).await?)
    }

    pub async fn delete(&self, user: &User, kind: ProductKind, id: i64) -> Result<(), ServiceError> {
        require_admin(user)?;
        self.product(kind, id).await?;
        self.products.delete(id).await?;
        Ok(())
    }

    async fn check_category(&self, category_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            if self.categories.get_by_id(id).await?.is_none() {
                return Err(ServiceError::invalid("categoryId", "category does not exist"));
            }
        }
        Ok(())
    }
}

fn kind_label(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Software => "Software",
        ProductKind::Website => "Website",
    }
}

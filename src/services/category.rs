//! Category service
//!
//! Categories group courses, blogs and products. Slugs are generated from
//! the name when not given and must be unique.

use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CategoryKind, CreateCategoryInput};
use crate::services::error::{resolve_slug, ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, kind: Option<CategoryKind>) -> Result<Vec<Category>, ServiceError> {
        Ok(self.repo.list(kind).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Category, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, ServiceError> {
        Validator::new().required(&input.name, "name").finish()?;

        let slug = resolve_slug(input.slug.as_deref(), &input.name)?;
        if self.repo.exists_by_slug(&slug).await? {
            return Err(ServiceError::Conflict(format!("Category slug '{}' already exists", slug)));
        }

        let category = self
            .repo
            .create(&Category {
                id: 0,
                slug,
                name: input.name.trim().to_string(),
                name_bn: input.name_bn,
                kind: input.kind,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Delete a category; referencing rows fall back to no category
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Category"));
        }
        Ok(())
    }
}

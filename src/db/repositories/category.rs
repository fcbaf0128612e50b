//! Category repository

use crate::db::DynDatabasePool;
use crate::models::{Category, CategoryKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::parse_column;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: &Category) -> Result<Category>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// List categories by name, optionally restricted to one kind
    async fn list(&self, kind: Option<CategoryKind>) -> Result<Vec<Category>>;

    /// Returns false when the category does not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO categories (slug, name, name_bn, kind, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.name_bn)
        .bind(category.kind.as_str())
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create category")?;

        Ok(Category {
            id: result.last_insert_rowid(),
            created_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, slug, name, name_bn, kind, created_at FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get category by ID")?;
        row.map(|r| row_to_category(&r)).transpose()
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to check category slug")?;
        Ok(count > 0)
    }

    async fn list(&self, kind: Option<CategoryKind>) -> Result<Vec<Category>> {
        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT id, slug, name, name_bn, kind, created_at FROM categories \
                     WHERE kind = ? ORDER BY name COLLATE NOCASE",
                )
                .bind(kind.as_str())
                .fetch_all(self.pool.pool())
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, slug, name, name_bn, kind, created_at FROM categories \
                     ORDER BY name COLLATE NOCASE",
                )
                .fetch_all(self.pool.pool())
                .await
            }
        }
        .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    let kind: String = row.get("kind");
    Ok(Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        name_bn: row.get("name_bn"),
        kind: parse_column(&kind, "kind")?,
        created_at: row.get("created_at"),
    })
}

//! Favorite repository

use crate::db::DynDatabasePool;
use crate::models::{Favorite, ProductType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::parse_column;

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn find(&self, user_id: i64, product_type: ProductType, product_id: i64) -> Result<Option<Favorite>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Favorite>>;

    async fn create(&self, user_id: i64, product_type: ProductType, product_id: i64) -> Result<Favorite>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// A user's favorites, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Favorite>>;
}

pub struct SqlxFavoriteRepository {
    pool: DynDatabasePool,
}

impl SqlxFavoriteRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FavoriteRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FavoriteRepository for SqlxFavoriteRepository {
    async fn find(&self, user_id: i64, product_type: ProductType, product_id: i64) -> Result<Option<Favorite>> {
        let row = sqlx::query(
            "SELECT id, product_type, product_id, user_id, created_at FROM favorites \
             WHERE user_id = ? AND product_type = ? AND product_id = ?",
        )
        .bind(user_id)
        .bind(product_type.as_str())
        .bind(product_id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to find favorite")?;
        row.map(|r| row_to_favorite(&r)).transpose()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Favorite>> {
        let row = sqlx::query("SELECT id, product_type, product_id, user_id, created_at FROM favorites WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get favorite")?;
        row.map(|r| row_to_favorite(&r)).transpose()
    }

    async fn create(&self, user_id: i64, product_type: ProductType, product_id: i64) -> Result<Favorite> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO favorites (product_type, product_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(product_type.as_str())
        .bind(product_id)
        .bind(user_id)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create favorite")?;

        Ok(Favorite {
            id: result.last_insert_rowid(),
            product_type,
            product_id,
            user_id,
            created_at: now,
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete favorite")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            "SELECT id, product_type, product_id, user_id, created_at FROM favorites \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list favorites")?;
        rows.iter().map(row_to_favorite).collect()
    }
}

fn row_to_favorite(row: &sqlx::sqlite::SqliteRow) -> Result<Favorite> {
    let product_type: String = row.get("product_type");
    Ok(Favorite {
        id: row.get("id"),
        product_type: parse_column(&product_type, "product_type")?,
        product_id: row.get("product_id"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}

//! Review repository

use crate::db::DynDatabasePool;
use crate::models::{ListParams, ProductType, Review, ReviewStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

use super::parse_column;

const REVIEW_COLUMNS: &str =
    "id, product_type, product_id, user_id, rating, comment, status, created_at, updated_at";

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: &Review) -> Result<Review>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>>;

    /// The review a user left on a product, if any
    async fn find_by_user(
        &self,
        product_type: ProductType,
        product_id: i64,
        user_id: i64,
    ) -> Result<Option<Review>>;

    /// Approved reviews of one product, newest first
    async fn list_approved(&self, product_type: ProductType, product_id: i64) -> Result<Vec<Review>>;

    /// Moderation queue; `None` lists every status
    async fn list(&self, status: Option<ReviewStatus>, params: &ListParams) -> Result<(Vec<Review>, i64)>;

    async fn update_status(&self, id: i64, status: ReviewStatus) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }
}

fn push_status_filter(qb: &mut QueryBuilder<'_, Sqlite>, status: Option<ReviewStatus>) {
    if let Some(status) = status {
        qb.push(" WHERE status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (product_type, product_id, user_id, rating, comment, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.product_type.as_str())
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.status.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create review")?;

        Ok(Review {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..review.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>> {
        let sql = format!("SELECT {} FROM reviews WHERE id = ?", REVIEW_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get review by ID")?;
        row.map(|r| row_to_review(&r)).transpose()
    }

    async fn find_by_user(
        &self,
        product_type: ProductType,
        product_id: i64,
        user_id: i64,
    ) -> Result<Option<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE product_type = ? AND product_id = ? AND user_id = ?",
            REVIEW_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(product_type.as_str())
            .bind(product_id)
            .bind(user_id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to find review")?;
        row.map(|r| row_to_review(&r)).transpose()
    }

    async fn list_approved(&self, product_type: ProductType, product_id: i64) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE product_type = ? AND product_id = ? AND status = 'approved' \
             ORDER BY created_at DESC, id DESC",
            REVIEW_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(product_type.as_str())
            .bind(product_id)
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list reviews")?;
        rows.iter().map(row_to_review).collect()
    }

    async fn list(&self, status: Option<ReviewStatus>, params: &ListParams) -> Result<(Vec<Review>, i64)> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM reviews");
        push_status_filter(&mut count_query, status);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count reviews")?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM reviews", REVIEW_COLUMNS));
        push_status_filter(&mut query, status);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list reviews")?;
        let reviews = rows.iter().map(row_to_review).collect::<Result<Vec<_>>>()?;
        Ok((reviews, total))
    }

    async fn update_status(&self, id: i64, status: ReviewStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE reviews SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to update review status")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete review")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> Result<Review> {
    let product_type: String = row.get("product_type");
    let status: String = row.get("status");
    Ok(Review {
        id: row.get("id"),
        product_type: parse_column(&product_type, "product_type")?,
        product_id: row.get("product_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        status: parse_column(&status, "status")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

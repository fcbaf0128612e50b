//! Lesson completion repository

use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Record a completion; returns false if it was already recorded
    async fn record(&self, user_id: i64, course_id: i64, lesson_id: i64) -> Result<bool>;

    /// Completed lesson ids of a user in one course, oldest completion first
    async fn completed_lessons(&self, user_id: i64, course_id: i64) -> Result<Vec<i64>>;
}

pub struct SqlxProgressRepository {
    pool: DynDatabasePool,
}

impl SqlxProgressRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProgressRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProgressRepository for SqlxProgressRepository {
    async fn record(&self, user_id: i64, course_id: i64, lesson_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO lesson_completions (user_id, course_id, lesson_id, completed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(lesson_id)
        .bind(Utc::now())
        .execute(self.pool.pool())
        .await
        .context("Failed to record lesson completion")?;
        Ok(result.rows_affected() > 0)
    }

    async fn completed_lessons(&self, user_id: i64, course_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT lesson_id FROM lesson_completions WHERE user_id = ? AND course_id = ? \
             ORDER BY completed_at, lesson_id",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list completed lessons")
    }
}

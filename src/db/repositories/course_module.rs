//! Course module repository

use crate::db::DynDatabasePool;
use crate::models::CourseModule;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait CourseModuleRepository: Send + Sync {
    async fn create(&self, module: &CourseModule) -> Result<CourseModule>;

    async fn get_by_id(&self, id: i64) -> Result<Option<CourseModule>>;

    /// Modules of a course in display order
    async fn list_by_course(&self, course_id: i64) -> Result<Vec<CourseModule>>;

    async fn update(&self, module: &CourseModule) -> Result<CourseModule>;

    /// Delete a module and its lessons
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxCourseModuleRepository {
    pool: DynDatabasePool,
}

impl SqlxCourseModuleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CourseModuleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CourseModuleRepository for SqlxCourseModuleRepository {
    async fn create(&self, module: &CourseModule) -> Result<CourseModule> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO course_modules (course_id, title, title_bn, sort_order, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(module.course_id)
        .bind(&module.title)
        .bind(&module.title_bn)
        .bind(module.order)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create module")?;

        Ok(CourseModule {
            id: result.last_insert_rowid(),
            created_at: now,
            ..module.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CourseModule>> {
        let row = sqlx::query(
            "SELECT id, course_id, title, title_bn, sort_order, created_at FROM course_modules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .context("Failed to get module by ID")?;
        Ok(row.as_ref().map(row_to_module))
    }

    async fn list_by_course(&self, course_id: i64) -> Result<Vec<CourseModule>> {
        let rows = sqlx::query(
            "SELECT id, course_id, title, title_bn, sort_order, created_at FROM course_modules \
             WHERE course_id = ? ORDER BY sort_order, id",
        )
        .bind(course_id)
        .fetch_all(self.pool.pool())
        .await
        .context("Failed to list modules")?;
        Ok(rows.iter().map(row_to_module).collect())
    }

    async fn update(&self, module: &CourseModule) -> Result<CourseModule> {
        sqlx::query("UPDATE course_modules SET title = ?, title_bn = ?, sort_order = ? WHERE id = ?")
            .bind(&module.title)
            .bind(&module.title_bn)
            .bind(module.order)
            .bind(module.id)
            .execute(self.pool.pool())
            .await
            .context("Failed to update module")?;
        Ok(module.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM course_modules WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete module")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_module(row: &sqlx::sqlite::SqliteRow) -> CourseModule {
    CourseModule {
        id: row.get("id"),
        course_id: row.get("course_id"),
        title: row.get("title"),
        title_bn: row.get("title_bn"),
        order: row.get("sort_order"),
        created_at: row.get("created_at"),
    }
}

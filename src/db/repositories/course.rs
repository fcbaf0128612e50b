//! Course repository

use crate::db::DynDatabasePool;
use crate::models::{CatalogFilter, Course, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

use super::{parse_column, push_catalog_filters};

const COURSE_COLUMNS: &str = "id, slug, title, title_bn, description, thumbnail, price, \
    discount_price, status, is_featured, is_popular, category_id, mentor_id, created_at, updated_at";

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: &Course) -> Result<Course>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// One page of courses matching `filter`, with the total match count
    async fn list(&self, filter: &CatalogFilter, params: &ListParams) -> Result<(Vec<Course>, i64)>;

    async fn update(&self, course: &Course) -> Result<Course>;

    /// Delete a course together with its modules, lessons and completions
    async fn delete(&self, id: i64) -> Result<bool>;

    /// (module count, lesson count)
    async fn curriculum_counts(&self, id: i64) -> Result<(i64, i64)>;
}

pub struct SqlxCourseRepository {
    pool: DynDatabasePool,
}

impl SqlxCourseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CourseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CourseRepository for SqlxCourseRepository {
    async fn create(&self, course: &Course) -> Result<Course> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO courses (slug, title, title_bn, description, thumbnail, price, discount_price,
                                 status, is_featured, is_popular, category_id, mentor_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&course.slug)
        .bind(&course.title)
        .bind(&course.title_bn)
        .bind(&course.description)
        .bind(&course.thumbnail)
        .bind(course.price)
        .bind(course.discount_price)
        .bind(course.status.as_str())
        .bind(course.is_featured)
        .bind(course.is_popular)
        .bind(course.category_id)
        .bind(course.mentor_id)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create course")?;

        Ok(Course {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..course.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>> {
        let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get course by ID")?;
        row.map(|r| row_to_course(&r)).transpose()
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to check course slug")?;
        Ok(count > 0)
    }

    async fn list(&self, filter: &CatalogFilter, params: &ListParams) -> Result<(Vec<Course>, i64)> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM courses");
        push_catalog_filters(&mut count_query, filter, true, Some("mentor_id"));
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count courses")?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM courses", COURSE_COLUMNS));
        push_catalog_filters(&mut query, filter, true, Some("mentor_id"));
        query
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list courses")?;

        let courses = rows.iter().map(row_to_course).collect::<Result<Vec<_>>>()?;
        Ok((courses, total))
    }

    async fn update(&self, course: &Course) -> Result<Course> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE courses SET slug = ?, title = ?, title_bn = ?, description = ?, thumbnail = ?,
                price = ?, discount_price = ?, status = ?, is_featured = ?, is_popular = ?,
                category_id = ?, mentor_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&course.slug)
        .bind(&course.title)
        .bind(&course.title_bn)
        .bind(&course.description)
        .bind(&course.thumbnail)
        .bind(course.price)
        .bind(course.discount_price)
        .bind(course.status.as_str())
        .bind(course.is_featured)
        .bind(course.is_popular)
        .bind(course.category_id)
        .bind(course.mentor_id)
        .bind(now)
        .bind(course.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update course")?;

        Ok(Course {
            updated_at: now,
            ..course.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete course")?;
        Ok(result.rows_affected() > 0)
    }

    async fn curriculum_counts(&self, id: i64) -> Result<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM course_modules WHERE course_id = ?) AS module_count,
                (SELECT COUNT(*) FROM lessons WHERE course_id = ?) AS lesson_count
            "#,
        )
        .bind(id)
        .bind(id)
        .fetch_one(self.pool.pool())
        .await
        .context("Failed to count course curriculum")?;

        Ok((row.get("module_count"), row.get("lesson_count")))
    }
}

fn row_to_course(row: &sqlx::sqlite::SqliteRow) -> Result<Course> {
    let status: String = row.get("status");
    Ok(Course {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        title_bn: row.get("title_bn"),
        description: row.get("description"),
        thumbnail: row.get("thumbnail"),
        price: row.get("price"),
        discount_price: row.get("discount_price"),
        status: parse_column(&status, "status")?,
        is_featured: row.get("is_featured"),
        is_popular: row.get("is_popular"),
        category_id: row.get("category_id"),
        mentor_id: row.get("mentor_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

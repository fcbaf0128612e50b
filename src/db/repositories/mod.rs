//! Database repositories
//!
//! Each repository handles persistence for one entity behind a trait, so
//! services can be handed an `Arc<dyn ...Repository>`.

pub mod blog;
pub mod category;
pub mod comment;
pub mod course;
pub mod course_module;
pub mod favorite;
pub mod lesson;
pub mod product;
pub mod progress;
pub mod review;
pub mod session;
pub mod user;

pub use blog::{BlogRepository, SqlxBlogRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use course::{CourseRepository, SqlxCourseRepository};
pub use course_module::{CourseModuleRepository, SqlxCourseModuleRepository};
pub use favorite::{FavoriteRepository, SqlxFavoriteRepository};
pub use lesson::{LessonRepository, SqlxLessonRepository};
pub use product::{ProductRepository, SqlxProductRepository};
pub use progress::{ProgressRepository, SqlxProgressRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;

use crate::models::CatalogFilter;

/// Append the WHERE clause shared by the catalog tables.
///
/// `with_flags` adds the featured/popular filters for tables that carry them.
/// `owner_column` names the column matched against `filter.owner_id`; a table
/// without one matches nothing when an owner is asked for.
pub(crate) fn push_catalog_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &CatalogFilter,
    with_flags: bool,
    owner_column: Option<&str>,
) {
    qb.push(" WHERE 1 = 1");
    if let Some(owner_id) = filter.owner_id {
        match owner_column {
            Some(column) => {
                qb.push(format!(" AND {} = ", column)).push_bind(owner_id);
            }
            None => {
                qb.push(" AND 1 = 0");
            }
        }
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(pattern) = filter.search_pattern() {
        qb.push(" AND LOWER(title) LIKE ").push_bind(pattern);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if with_flags {
        if let Some(featured) = filter.featured {
            qb.push(" AND is_featured = ").push_bind(featured);
        }
        if let Some(popular) = filter.popular {
            qb.push(" AND is_popular = ").push_bind(popular);
        }
    }
}

/// Parse an enum column, naming the column in the error
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    T::from_str(value).with_context(|| format!("Invalid {} in database: {}", column, value))
}

/// Decode a JSON text column
pub(crate) fn parse_json_column<T: serde::de::DeserializeOwned>(value: &str, column: &str) -> Result<T> {
    serde_json::from_str(value).with_context(|| format!("Invalid JSON in column {}", column))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    pub async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    pub async fn insert_user(pool: &DynDatabasePool, email: &str, role: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, role) VALUES ('Test User', ?, 'hash', ?)",
        )
        .bind(email)
        .bind(role)
        .execute(pool.pool())
        .await
        .expect("Failed to insert user")
        .last_insert_rowid()
    }

    pub async fn insert_course(pool: &DynDatabasePool, slug: &str, mentor_id: Option<i64>) -> i64 {
        sqlx::query(
            "INSERT INTO courses (slug, title, status, mentor_id, created_at, updated_at) \
             VALUES (?, ?, 'published', ?, datetime('now'), datetime('now'))",
        )
        .bind(slug)
        .bind(slug)
        .bind(mentor_id)
        .execute(pool.pool())
        .await
        .expect("Failed to insert course")
        .last_insert_rowid()
    }

    pub async fn insert_module(pool: &DynDatabasePool, course_id: i64, order: i64) -> i64 {
        sqlx::query("INSERT INTO course_modules (course_id, title, sort_order) VALUES (?, 'Module', ?)")
            .bind(course_id)
            .bind(order)
            .execute(pool.pool())
            .await
            .expect("Failed to insert module")
            .last_insert_rowid()
    }

    pub async fn insert_lesson(pool: &DynDatabasePool, course_id: i64, module_id: i64, order: i64) -> i64 {
        sqlx::query(
            "INSERT INTO lessons (course_id, module_id, title, sort_order) VALUES (?, ?, 'Lesson', ?)",
        )
        .bind(course_id)
        .bind(module_id)
        .bind(order)
        .execute(pool.pool())
        .await
        .expect("Failed to insert lesson")
        .last_insert_rowid()
    }
}

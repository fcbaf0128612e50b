//! Blog comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::models::{gravatar_url, BlogComment};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment; the returned value carries the author's display data
    async fn create(&self, blog_id: i64, user_id: i64, content: &str) -> Result<BlogComment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogComment>>;

    /// Comments of a blog, oldest first
    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<BlogComment>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.blog_id, c.user_id, c.content, c.created_at,
           u.name AS author_name, u.email AS author_email, u.avatar AS author_avatar
    FROM blog_comments c
    JOIN users u ON u.id = c.user_id
"#;

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, blog_id: i64, user_id: i64, content: &str) -> Result<BlogComment> {
        let result = sqlx::query(
            "INSERT INTO blog_comments (blog_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(blog_id)
        .bind(user_id)
        .bind(content)
        .bind(Utc::now())
        .execute(self.pool.pool())
        .await
        .context("Failed to create comment")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .with_context(|| format!("Comment {} missing after insert", id))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogComment>> {
        let sql = format!("{} WHERE c.id = ?", COMMENT_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get comment by ID")?;
        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<BlogComment>> {
        let sql = format!("{} WHERE c.blog_id = ? ORDER BY c.created_at ASC, c.id ASC", COMMENT_SELECT);
        let rows = sqlx::query(&sql)
            .bind(blog_id)
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list comments")?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_comments WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> BlogComment {
    let email: String = row.get("author_email");
    let avatar: Option<String> = row.get("author_avatar");
    BlogComment {
        id: row.get("id"),
        blog_id: row.get("blog_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        avatar_url: avatar
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| gravatar_url(&email)),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, migrated_pool};

    async fn insert_blog(pool: &DynDatabasePool, author_id: i64) -> i64 {
        sqlx::query("INSERT INTO blogs (slug, title, content, author_id, status) VALUES ('b', 'B', '', ?, 'published')")
            .bind(author_id)
            .execute(pool.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_carries_author() {
        let pool = migrated_pool().await;
        let user_id = insert_user(&pool, "reader@example.com", "user").await;
        let blog_id = insert_blog(&pool, user_id).await;
        let repo = SqlxCommentRepository::new(pool);

        let comment = repo.create(blog_id, user_id, "Nice post").await.unwrap();
        assert_eq!(comment.author_name, "Test User");
        assert_eq!(comment.avatar_url, gravatar_url("reader@example.com"));
        assert_eq!(comment.content, "Nice post");
    }

    #[tokio::test]
    async fn test_list_oldest_first_and_delete() {
        let pool = migrated_pool().await;
        let user_id = insert_user(&pool, "reader@example.com", "user").await;
        let blog_id = insert_blog(&pool, user_id).await;
        let repo = SqlxCommentRepository::new(pool);

        let first = repo.create(blog_id, user_id, "first").await.unwrap();
        repo.create(blog_id, user_id, "second").await.unwrap();

        let contents: Vec<String> = repo
            .list_by_blog(blog_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
        assert_eq!(repo.list_by_blog(blog_id).await.unwrap().len(), 1);
    }
}

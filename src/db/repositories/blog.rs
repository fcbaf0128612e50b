//! Blog repository
//!
//! Tags are kept in `blog_tags` and loaded alongside each blog.

use crate::db::DynDatabasePool;
use crate::models::{Blog, CatalogFilter, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::{parse_column, push_catalog_filters};

const BLOG_COLUMNS: &str = "id, slug, title, title_bn, content, excerpt, thumbnail, category_id, \
    author_id, status, view_count, created_at, updated_at";

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// One page of blogs matching `filter` (including `tag`), with the total
    async fn list(&self, filter: &CatalogFilter, params: &ListParams) -> Result<(Vec<Blog>, i64)>;

    /// Update a blog, replacing its tags
    async fn update(&self, blog: &Blog) -> Result<Blog>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn increment_view_count(&self, id: i64) -> Result<()>;
}

pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

fn push_blog_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &CatalogFilter) {
    push_catalog_filters(qb, filter, false, Some("author_id"));
    if let Some(tag) = filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        qb.push(" AND id IN (SELECT blog_id FROM blog_tags WHERE tag = ")
            .push_bind(tag.to_lowercase())
            .push(")");
    }
}

async fn replace_tags(
    conn: &mut sqlx::SqliteConnection,
    blog_id: i64,
    tags: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM blog_tags WHERE blog_id = ?")
        .bind(blog_id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear blog tags")?;

    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO blog_tags (blog_id, tag) VALUES (?, ?)")
            .bind(blog_id)
            .bind(tag)
            .execute(&mut *conn)
            .await
            .context("Failed to insert blog tag")?;
    }
    Ok(())
}

async fn load_tags(pool: &SqlitePool, blog_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
    let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
    if blog_ids.is_empty() {
        return Ok(tags);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT blog_id, tag FROM blog_tags WHERE blog_id IN (");
    let mut separated = qb.separated(", ");
    for id in blog_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY tag");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to load blog tags")?;
    for row in rows {
        tags.entry(row.get("blog_id")).or_default().push(row.get("tag"));
    }
    Ok(tags)
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        let now = Utc::now();
        let mut tx = self.pool.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO blogs (slug, title, title_bn, content, excerpt, thumbnail, category_id,
                               author_id, status, view_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.title_bn)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(&blog.thumbnail)
        .bind(blog.category_id)
        .bind(blog.author_id)
        .bind(blog.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create blog")?;

        let id = result.last_insert_rowid();
        replace_tags(&mut *tx, id, &blog.tags).await?;
        tx.commit().await?;

        Ok(Blog {
            id,
            view_count: 0,
            created_at: now,
            updated_at: now,
            ..blog.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        let sql = format!("SELECT {} FROM blogs WHERE id = ?", BLOG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get blog by ID")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut blog = row_to_blog(&row)?;
        blog.tags = load_tags(self.pool.pool(), &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(blog))
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blogs WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to check blog slug")?;
        Ok(count > 0)
    }

    async fn list(&self, filter: &CatalogFilter, params: &ListParams) -> Result<(Vec<Blog>, i64)> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM blogs");
        push_blog_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count blogs")?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {} FROM blogs", BLOG_COLUMNS));
        push_blog_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(filter.sort.order_by_unpriced())
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list blogs")?;

        let mut blogs = rows.iter().map(row_to_blog).collect::<Result<Vec<_>>>()?;
        let ids: Vec<i64> = blogs.iter().map(|b| b.id).collect();
        let mut tags = load_tags(self.pool.pool(), &ids).await?;
        for blog in &mut blogs {
            blog.tags = tags.remove(&blog.id).unwrap_or_default();
        }

        Ok((blogs, total))
    }

    async fn update(&self, blog: &Blog) -> Result<Blog> {
        let now = Utc::now();
        let mut tx = self.pool.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE blogs SET slug = ?, title = ?, title_bn = ?, content = ?, excerpt = ?, thumbnail = ?,
                category_id = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.title_bn)
        .bind(&blog.content)
        .bind(&blog.excerpt)
        .bind(&blog.thumbnail)
        .bind(blog.category_id)
        .bind(blog.status.as_str())
        .bind(now)
        .bind(blog.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update blog")?;

        replace_tags(&mut *tx, blog.id, &blog.tags).await?;
        tx.commit().await?;

        Ok(Blog {
            updated_at: now,
            ..blog.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete blog")?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to increment blog view count")?;
        Ok(())
    }
}

fn row_to_blog(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    let status: String = row.get("status");
    Ok(Blog {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        title_bn: row.get("title_bn"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        thumbnail: row.get("thumbnail"),
        category_id: row.get("category_id"),
        author_id: row.get("author_id"),
        tags: Vec::new(),
        status: parse_column(&status, "status")?,
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

//! Blog service
//!
//! Implements blog posts and their comments:
//! - Staff write posts; authors and admins edit them
//! - Post HTML is sanitized with ammonia before it is stored
//! - Comments are stored as plain text
//! - Reading a post counts a view

use crate::db::repositories::{BlogRepository, CategoryRepository, CommentRepository};
use crate::models::{
    Blog, BlogComment, CatalogFilter, CreateBlogInput, ListParams, PagedResult, PublishStatus,
    UpdateBlogInput, User,
};
use crate::services::course::scope_filter;
use crate::services::error::{resolve_slug, ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

const MAX_COMMENT_LEN: usize = 2_000;

/// Sanitize post HTML, keeping safe formatting
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Strip every tag from a comment, leaving escaped text
pub fn sanitize_comment(text: &str) -> String {
    ammonia::Builder::empty().clean(text.trim()).to_string()
}

/// Lowercase, trim and dedupe tags, dropping blanks
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn ensure_blog_visible(blog: &Blog, viewer: Option<&User>) -> Result<(), ServiceError> {
    let visible = blog.status == PublishStatus::Published
        || viewer.is_some_and(|u| u.is_staff() && u.can_edit(Some(blog.author_id)));
    if visible {
        Ok(())
    } else {
        Err(ServiceError::not_found("Blog"))
    }
}

fn authorize_blog_edit(user: &User, blog: &Blog) -> Result<(), ServiceError> {
    if user.can_edit(Some(blog.author_id)) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Only the author or an admin can modify this blog".to_string()))
    }
}

pub struct BlogService {
    blogs: Arc<dyn BlogRepository>,
    comments: Arc<dyn CommentRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl BlogService {
    pub fn new(
        blogs: Arc<dyn BlogRepository>,
        comments: Arc<dyn CommentRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            blogs,
            comments,
            categories,
        }
    }

    async fn blog(&self, id: i64) -> Result<Blog, ServiceError> {
        self.blogs
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Blog"))
    }

    pub async fn list(
        &self,
        filter: CatalogFilter,
        params: &ListParams,
        viewer: Option<&User>,
    ) -> Result<PagedResult<Blog>, ServiceError> {
        let filter = scope_filter(filter, viewer);
        let (blogs, total) = self.blogs.list(&filter, params).await?;
        Ok(PagedResult::new(blogs, total, params))
    }

    /// Read a post, counting the view
    pub async fn view(&self, id: i64, viewer: Option<&User>) -> Result<Blog, ServiceError> {
        let mut blog = self.blog(id).await?;
        ensure_blog_visible(&blog, viewer)?;

        self.blogs.increment_view_count(id).await?;
        blog.view_count += 1;
        Ok(blog)
    }

    pub async fn create(&self, user: &User, input: CreateBlogInput) -> Result<Blog, ServiceError> {
        if !user.is_staff() {
            return Err(ServiceError::Forbidden("Only mentors and admins can write blogs".to_string()));
        }

        let content = sanitize_html(&input.content);
        Validator::new()
            .required(&input.title, "title")
            .required(&content, "content")
            .finish()?;

        let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
        if self.blogs.exists_by_slug(&slug).await? {
            return Err(ServiceError::Conflict(format!("Blog slug '{}' already exists", slug)));
        }
        self.check_category(input.category_id).await?;

        let now = Utc::now();
        let blog = self
            .blogs
            .create(&Blog {
                id: 0,
                slug,
                title: input.title.trim().to_string(),
                title_bn: input.title_bn,
                content,
                excerpt: input.excerpt,
                thumbnail: input.thumbnail,
                category_id: input.category_id,
                author_id: user.id,
                tags: normalize_tags(input.tags),
                status: input.status,
                view_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(blog_id = blog.id, author_id = user.id, "Blog created");
        Ok(blog)
    }

    pub async fn update(&self, user: &User, id: i64, input: UpdateBlogInput) -> Result<Blog, ServiceError> {
        let mut blog = self.blog(id).await?;
        authorize_blog_edit(user, &blog)?;

        let content = input.content.as_deref().map(sanitize_html);
        let mut validator = Validator::new();
        if let Some(title) = &input.title {
            validator.required(title, "title");
        }
        if let Some(content) = &content {
            validator.required(content, "content");
        }
        validator.finish()?;

        if let Some(slug) = input.slug.as_deref() {
            let slug = resolve_slug(Some(slug), &blog.title)?;
            if slug != blog.slug && self.blogs.exists_by_slug(&slug).await? {
                return Err(ServiceError::Conflict(format!("Blog slug '{}' already exists", slug)));
            }
            blog.slug = slug;
        }
        if let Some(category_id) = input.category_id {
            self.check_category(category_id).await?;
            blog.category_id = category_id;
        }
        if let Some(title) = input.title {
            blog.title = title.trim().to_string();
        }
        if input.title_bn.is_some() {
            blog.title_bn = input.title_bn;
        }
        if let Some(content) = content {
            blog.content = content;
        }
        if input.excerpt.is_some() {
            blog.excerpt = input.excerpt;
        }
        if input.thumbnail.is_some() {
            blog.thumbnail = input.thumbnail;
        }
        if let Some(tags) = input.tags {
            blog.tags = normalize_tags(tags);
        }
        if let Some(status) = input.status {
            blog.status = status;
        }

        Ok(self.blogs.update(&blog).await?)
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let blog = self.blog(id).await?;
        authorize_blog_edit(user, &blog)?;
        self.blogs.delete(id).await?;
        Ok(())
    }

    /// Comments of a visible post, oldest first
    pub async fn comments(&self, blog_id: i64, viewer: Option<&User>) -> Result<Vec<BlogComment>, ServiceError> {
        let blog = self.blog(blog_id).await?;
        ensure_blog_visible(&blog, viewer)?;
        Ok(self.comments.list_by_blog(blog_id).await?)
    }

    pub async fn add_comment(&self, user: &User, blog_id: i64, content: &str) -> Result<BlogComment, ServiceError> {
        let blog = self.blog(blog_id).await?;
        ensure_blog_visible(&blog, Some(user))?;

        let content = sanitize_comment(content);
        Validator::new()
            .required(&content, "content")
            .check(
                content.chars().count() <= MAX_COMMENT_LEN,
                "content",
                "content is too long",
            )
            .finish()?;

        Ok(self.comments.create(blog_id, user.id, &content).await?)
    }

    /// Delete a comment; its writer and admins may do this
    pub async fn delete_comment(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let comment = self
            .comments
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))?;

        if !user.can_edit(Some(comment.user_id)) {
            return Err(ServiceError::Forbidden("You can only delete your own comments".to_string()));
        }
        self.comments.delete(id).await?;
        Ok(())
    }

    async fn check_category(&self, category_id: Option<i64>) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            if self.categories.get_by_id(id).await?.is_none() {
                return Err(ServiceError::invalid("categoryId", "category does not exist"));
            }
        }
        Ok(())
    }
}

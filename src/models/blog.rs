//! Blog and blog comment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::PublishStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub title_bn: Option<String>,
    /// Sanitized HTML
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: i64,
    pub tags: Vec<String>,
    pub status: PublishStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogInput {
    pub title: String,
    #[serde(default)]
    pub title_bn: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PublishStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogInput {
    pub title: Option<String>,
    pub title_bn: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    /// Explicit `null` clears the category
    #[serde(default, deserialize_with = "super::listing::nullable")]
    pub category_id: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PublishStatus>,
}

/// Comment on a blog post, with its author's display data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComment {
    pub id: i64,
    pub blog_id: i64,
    pub user_id: i64,
    /// Sanitized HTML
    pub content: String,
    pub author_name: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub content: String,
}

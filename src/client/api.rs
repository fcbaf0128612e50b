//! Typed HTTP client for the MotionBoss API

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ClientError;
use crate::api::PageMeta;
use crate::curriculum::{group, Curriculum, DocId, LessonDoc, ModuleDoc};
use crate::models::{
    AuthPayload, Blog, BlogComment, CompleteLessonInput, Course, CourseProgress as ProgressSummary,
    CreateCommentInput, CreateReviewInput, Favorite, LoginInput, ProductType, RegisterInput,
    Review, SortOrder, ToggleFavoriteInput, User,
};
use crate::services::FieldError;

/// Longest comment the server accepts
pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
    #[serde(default)]
    meta: Option<PageMeta>,
    #[serde(default)]
    error_messages: Vec<FieldError>,
}

/// One page of a list endpoint
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

/// Filters for catalog lists
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Course content as fetched by a learner
///
/// Modules and lessons are kept as loose documents so the curriculum can
/// be regrouped locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContentDocs {
    pub course: Course,
    pub modules: Vec<ModuleDoc>,
    pub lessons: Vec<LessonDoc>,
    #[serde(default)]
    pub completed_lessons: Vec<DocId>,
}

impl CourseContentDocs {
    pub fn curriculum(&self) -> Curriculum<ModuleDoc, LessonDoc> {
        group(&self.modules, &self.lessons)
    }

    pub fn completed_keys(&self) -> Vec<String> {
        self.completed_lessons.iter().map(DocId::as_key).collect()
    }
}

#[derive(Debug, Deserialize)]
struct FavoriteToggle {
    favorited: bool,
}

/// Decode a response body into the success payload or a typed error
fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Envelope<T>, ClientError> {
    let success_status = (200..300).contains(&status);

    if !success_status {
        return Err(match serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
            Ok(envelope) => ClientError::Api {
                status,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("request failed with status {}", status)),
                errors: envelope.error_messages,
            },
            Err(_) => ClientError::Api {
                status,
                message: String::from_utf8_lossy(body).trim().to_string(),
                errors: Vec::new(),
            },
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(ClientError::Api {
            status,
            message: envelope.message.unwrap_or_default(),
            errors: envelope.error_messages,
        });
    }
    Ok(envelope)
}

fn validate_comment(content: &str) -> Result<(), ClientError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ClientError::invalid("content", "comment must not be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ClientError::invalid("content", "comment is too long"));
    }
    Ok(())
}

fn validate_review(input: &CreateReviewInput) -> Result<(), ClientError> {
    if !(1..=5).contains(&input.rating) {
        return Err(ClientError::invalid("rating", "rating must be between 1 and 5"));
    }
    Ok(())
}

/// HTTP client holding the base URL and the session token
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api/v1`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("motionboss/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Envelope<T>, ClientError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        decode_envelope(status, &body)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.execute::<T>(builder)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }

    async fn fetch_page<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ListPage<T>, ClientError> {
        let envelope = self.execute::<Vec<T>>(builder).await?;
        Ok(ListPage {
            items: envelope.data.unwrap_or_default(),
            meta: envelope.meta,
        })
    }

    /// Create an account; the returned token is kept for later calls
    pub async fn register(&mut self, input: &RegisterInput) -> Result<AuthPayload, ClientError> {
        let payload: AuthPayload = self
            .fetch(self.request(Method::POST, "/auth/register").json(input))
            .await?;
        self.token = Some(payload.access_token.clone());
        Ok(payload)
    }

    /// Sign in; the returned token is kept for later calls
    pub async fn login(&mut self, input: &LoginInput) -> Result<AuthPayload, ClientError> {
        let payload: AuthPayload = self
            .fetch(self.request(Method::POST, "/auth/login").json(input))
            .await?;
        self.token = Some(payload.access_token.clone());
        Ok(payload)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.execute::<serde_json::Value>(self.request(Method::POST, "/auth/logout"))
            .await?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.fetch(self.request(Method::GET, "/auth/me")).await
    }

    pub async fn list_courses(&self, query: &ListQuery) -> Result<ListPage<Course>, ClientError> {
        self.fetch_page(self.request(Method::GET, "/courses").query(query))
            .await
    }

    pub async fn course_content(&self, course_id: i64) -> Result<CourseContentDocs, ClientError> {
        let path = format!("/courses/{}/content", course_id);
        self.fetch(self.request(Method::GET, &path)).await
    }

    pub async fn mark_lesson_complete(&self, course_id: i64, lesson_id: i64) -> Result<ProgressSummary, ClientError> {
        let path = format!("/courses/{}/progress", course_id);
        self.fetch(
            self.request(Method::POST, &path)
                .json(&CompleteLessonInput { lesson_id }),
        )
        .await
    }

    pub async fn course_progress(&self, course_id: i64) -> Result<ProgressSummary, ClientError> {
        let path = format!("/courses/{}/progress", course_id);
        self.fetch(self.request(Method::GET, &path)).await
    }

    pub async fn list_blogs(&self, query: &ListQuery) -> Result<ListPage<Blog>, ClientError> {
        self.fetch_page(self.request(Method::GET, "/blogs").query(query))
            .await
    }

    pub async fn blog_comments(&self, blog_id: i64) -> Result<Vec<BlogComment>, ClientError> {
        let path = format!("/blogs/{}/comments", blog_id);
        self.fetch(self.request(Method::GET, &path)).await
    }

    /// Post a comment; blank comments are rejected locally
    pub async fn post_blog_comment(&self, blog_id: i64, content: &str) -> Result<BlogComment, ClientError> {
        validate_comment(content)?;
        let path = format!("/blogs/{}/comments", blog_id);
        let input = CreateCommentInput {
            content: content.trim().to_string(),
        };
        self.fetch(self.request(Method::POST, &path).json(&input))
            .await
    }

    pub async fn favorites(&self) -> Result<Vec<Favorite>, ClientError> {
        self.fetch(self.request(Method::GET, "/favorites/all")).await
    }

    /// Returns whether the product is now a favorite
    pub async fn toggle_favorite(&self, product_type: ProductType, product_id: i64) -> Result<bool, ClientError> {
        let input = ToggleFavoriteInput {
            product_type,
            product_id,
        };
        let toggle: FavoriteToggle = self
            .fetch(self.request(Method::POST, "/favorites").json(&input))
            .await?;
        Ok(toggle.favorited)
    }

    /// Submit a review; ratings outside 1 to 5 are rejected locally
    pub async fn submit_review(&self, input: &CreateReviewInput) -> Result<Review, ClientError> {
        validate_review(input)?;
        self.fetch(self.request(Method::POST, "/reviews").json(input))
            .await
    }
}

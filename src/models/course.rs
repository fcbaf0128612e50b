//! Course model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::PublishStatus;
use super::{CourseModule, Lesson};
use crate::curriculum::Section;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub title_bn: Option<String>,
    pub description: String,
    pub thumbnail: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub status: PublishStatus,
    pub is_featured: bool,
    pub is_popular: bool,
    pub category_id: Option<i64>,
    /// Owning mentor; `None` once the mentor account is gone
    pub mentor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Price the buyer pays
    pub fn effective_price(&self) -> f64 {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Course with curriculum counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub module_count: i64,
    pub lesson_count: i64,
}

/// Everything a learner needs to work through a course
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContent {
    pub course: Course,
    pub modules: Vec<CourseModule>,
    pub lessons: Vec<Lesson>,
    pub curriculum: Vec<Section<CourseModule, Lesson>>,
    /// Lessons the caller has completed; empty for anonymous callers
    #[serde(default)]
    pub completed_lessons: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseInput {
    pub title: String,
    #[serde(default)]
    pub title_bn: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Admins may assign a mentor; mentors always own what they create
    #[serde(default)]
    pub mentor_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub title_bn: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub price: Option<f64>,
    /// Explicit `null` clears the discount
    #[serde(default, deserialize_with = "super::listing::nullable")]
    pub discount_price: Option<Option<f64>>,
    pub status: Option<PublishStatus>,
    pub is_featured: Option<bool>,
    pub is_popular: Option<bool>,
    /// Explicit `null` clears the category
    #[serde(default, deserialize_with = "super::listing::nullable")]
    pub category_id: Option<Option<i64>>,
}

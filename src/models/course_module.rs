//! Course module model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumModule;

/// A named, ordered group of lessons within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub title_bn: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

impl CurriculumModule for CourseModule {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn order(&self) -> Option<i64> {
        Some(self.order)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleInput {
    pub course_id: i64,
    pub title: String,
    #[serde(default)]
    pub title_bn: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModuleInput {
    pub title: Option<String>,
    pub title_bn: Option<String>,
    pub order: Option<i64>,
}

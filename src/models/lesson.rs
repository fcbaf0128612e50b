//! Lesson model
//!
//! A lesson can carry a video, free text, structured text blocks,
//! downloadable documents and a quiz. The structured parts are stored as
//! JSON columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumLesson;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub heading: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDocument {
    pub title: String,
    pub url: String,
}

/// Multiple-choice quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    #[serde(rename = "module")]
    pub module_id: i64,
    pub title: String,
    pub title_bn: Option<String>,
    pub order: i64,
    pub video_url: Option<String>,
    /// Seconds
    pub video_duration: Option<i64>,
    pub text_content: Option<String>,
    pub text_blocks: Vec<TextBlock>,
    pub documents: Vec<LessonDocument>,
    pub questions: Vec<Question>,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CurriculumLesson for Lesson {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn module_key(&self) -> Option<String> {
        Some(self.module_id.to_string())
    }

    fn order(&self) -> Option<i64> {
        Some(self.order)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonInput {
    pub course_id: i64,
    #[serde(rename = "module")]
    pub module_id: i64,
    pub title: String,
    #[serde(default)]
    pub title_bn: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_duration: Option<i64>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default)]
    pub documents: Vec<LessonDocument>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub is_free: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonInput {
    #[serde(rename = "module")]
    pub module_id: Option<i64>,
    pub title: Option<String>,
    pub title_bn: Option<String>,
    pub order: Option<i64>,
    pub video_url: Option<String>,
    pub video_duration: Option<i64>,
    pub text_content: Option<String>,
    pub text_blocks: Option<Vec<TextBlock>>,
    pub documents: Option<Vec<LessonDocument>>,
    pub questions: Option<Vec<Question>>,
    pub is_free: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_reads_module_field() {
        let input: CreateLessonInput = serde_json::from_value(serde_json::json!({
            "courseId": 1,
            "module": 4,
            "title": "Ownership",
            "questions": [
                { "question": "Who owns it?", "options": ["a", "b"], "correctIndex": 1 }
            ]
        }))
        .unwrap();

        assert_eq!(input.module_id, 4);
        assert_eq!(input.questions[0].correct_index, 1);
        assert!(input.text_blocks.is_empty());
        assert!(!input.is_free);
    }
}

//! Learner progress model

use serde::{Deserialize, Serialize};

/// A learner's progress through one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: i64,
    pub completed_lessons: Vec<i64>,
    pub total_lessons: i64,
    /// Whole percent, 0 to 100
    pub percent: u32,
}

impl CourseProgress {
    pub fn new(course_id: i64, completed_lessons: Vec<i64>, total_lessons: i64) -> Self {
        let percent = if total_lessons <= 0 {
            0
        } else {
            (completed_lessons.len() as i64 * 100 / total_lessons).min(100) as u32
        };
        Self {
            course_id,
            completed_lessons,
            total_lessons,
            percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonInput {
    pub lesson_id: i64,
}

//! Progress sink backed by the course progress endpoint

use async_trait::async_trait;

use super::api::ApiClient;
use super::error::ClientError;
use crate::curriculum::ProgressSink;

/// Records lesson completions for one course through the API
#[derive(Debug, Clone, Copy)]
pub struct CourseProgress<'a> {
    client: &'a ApiClient,
    course_id: i64,
}

impl<'a> CourseProgress<'a> {
    pub fn new(client: &'a ApiClient, course_id: i64) -> Self {
        Self { client, course_id }
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }
}

#[async_trait]
impl ProgressSink for CourseProgress<'_> {
    type Error = ClientError;

    async fn record_completion(&self, lesson_key: &str) -> Result<(), ClientError> {
        let lesson_id: i64 = lesson_key
            .parse()
            .map_err(|_| ClientError::invalid("lessonId", "lesson id must be numeric"))?;
        let summary = self
            .client
            .mark_lesson_complete(self.course_id, lesson_id)
            .await?;
        tracing::debug!(
            course_id = self.course_id,
            lesson_id,
            percent = summary.percent,
            "Lesson completion recorded"
        );
        Ok(())
    }
}

//! Learner progress service

use crate::db::repositories::{CourseRepository, LessonRepository, ProgressRepository};
use crate::models::{Course, CourseProgress, User};
use crate::services::course::ensure_course_visible;
use crate::services::error::ServiceError;
use std::sync::Arc;

pub struct ProgressService {
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            courses,
            lessons,
            progress,
        }
    }

    async fn visible_course(&self, user: &User, course_id: i64) -> Result<Course, ServiceError> {
        let course = self
            .courses
            .get_by_id(course_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course"))?;
        ensure_course_visible(&course, Some(user))?;
        Ok(course)
    }

    /// Record a completed lesson and return the updated progress.
    ///
    /// Completing a lesson twice is not an error.
    pub async fn complete_lesson(
        &self,
        user: &User,
        course_id: i64,
        lesson_id: i64,
    ) -> Result<CourseProgress, ServiceError> {
        self.visible_course(user, course_id).await?;

        match self.lessons.get_by_id(lesson_id).await? {
            Some(lesson) if lesson.course_id == course_id => {}
            _ => {
                return Err(ServiceError::invalid(
                    "lessonId",
                    "lesson does not belong to this course",
                ))
            }
        }

        if self.progress.record(user.id, course_id, lesson_id).await? {
            tracing::debug!(user_id = user.id, course_id, lesson_id, "Lesson completed");
        }
        self.progress(user, course_id).await
    }

    pub async fn progress(&self, user: &User, course_id: i64) -> Result<CourseProgress, ServiceError> {
        self.visible_course(user, course_id).await?;

        let completed = self.progress.completed_lessons(user.id, course_id).await?;
        let total = self.lessons.count_by_course(course_id).await?;
        Ok(CourseProgress::new(course_id, completed, total))
    }
}

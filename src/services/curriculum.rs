//! Module and lesson management
//!
//! Every change here is made by the course owner and drops the course's
//! cached content bundle. A lesson's module must belong to the lesson's
//! course.

use crate::cache::Cache;
use crate::db::repositories::{CourseModuleRepository, CourseRepository, LessonRepository};
use crate::models::{
    Course, CourseModule, CreateLessonInput, CreateModuleInput, Lesson, Question,
    UpdateLessonInput, UpdateModuleInput, User,
};
use crate::services::course::{authorize_course_edit, ensure_course_visible, invalidate_course_content};
use crate::services::error::{ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

pub struct CurriculumService {
    courses: Arc<dyn CourseRepository>,
    modules: Arc<dyn CourseModuleRepository>,
    lessons: Arc<dyn LessonRepository>,
    cache: Arc<Cache>,
}

impl CurriculumService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        modules: Arc<dyn CourseModuleRepository>,
        lessons: Arc<dyn LessonRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            courses,
            modules,
            lessons,
            cache,
        }
    }

    async fn course(&self, id: i64) -> Result<Course, ServiceError> {
        self.courses
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course"))
    }

    async fn module(&self, id: i64) -> Result<CourseModule, ServiceError> {
        self.modules
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Module"))
    }

    async fn lesson(&self, id: i64) -> Result<Lesson, ServiceError> {
        self.lessons
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Lesson"))
    }

    /// Load a course and check that `user` may edit it
    async fn owned_course(&self, user: &User, course_id: i64) -> Result<Course, ServiceError> {
        let course = self.course(course_id).await?;
        authorize_course_edit(user, &course)?;
        Ok(course)
    }

    /// Add a module to a course
    ///
    /// # Arguments
    /// * `user` - The course owner or an admin
    /// * `input` - Module creation input, naming the course
    ///
    /// # Errors
    /// - `Validation` if the title is empty
    /// - `NotFound` if the course doesn't exist
    /// - `Forbidden` if `user` may not edit the course
    pub async fn create_module(&self, user: &User, input: CreateModuleInput) -> Result<CourseModule, ServiceError> {
        Validator::new().required(&input.title, "title").finish()?;
        self.owned_course(user, input.course_id).await?;

        let module = self
            .modules
            .create(&CourseModule {
                id: 0,
                course_id: input.course_id,
                title: input.title.trim().to_string(),
                title_bn: input.title_bn,
                order: input.order,
                created_at: Utc::now(),
            })
            .await?;

        invalidate_course_content(&self.cache, module.course_id).await;
        Ok(module)
    }

    pub async fn update_module(
        &self,
        user: &User,
        id: i64,
        input: UpdateModuleInput,
    ) -> Result<CourseModule, ServiceError> {
        let mut module = self.module(id).await?;
        self.owned_course(user, module.course_id).await?;

        if let Some(title) = input.title {
            Validator::new().required(&title, "title").finish()?;
            module.title = title.trim().to_string();
        }
        if input.title_bn.is_some() {
            module.title_bn = input.title_bn;
        }
        if let Some(order) = input.order {
            module.order = order;
        }

        let module = self.modules.update(&module).await?;
        invalidate_course_content(&self.cache, module.course_id).await;
        Ok(module)
    }

    /// Delete a module and its lessons
    pub async fn delete_module(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let module = self.module(id).await?;
        self.owned_course(user, module.course_id).await?;

        self.modules.delete(id).await?;
        invalidate_course_content(&self.cache, module.course_id).await;
        Ok(())
    }

    /// A lesson, if its course is visible to `viewer`
    pub async fn get_lesson(&self, id: i64, viewer: Option<&User>) -> Result<Lesson, ServiceError> {
        let lesson = self.lesson(id).await?;
        let course = self.course(lesson.course_id).await?;
        ensure_course_visible(&course, viewer).map_err(|_| ServiceError::not_found("Lesson"))?;
        Ok(lesson)
    }

    /// Add a lesson to a course
    ///
    /// # Arguments
    /// * `user` - The course owner or an admin
    /// * `input` - Lesson creation input, naming the course and module
    ///
    /// # Returns
    /// The created lesson
    ///
    /// # Errors
    /// - `Validation` if the title, video duration or quiz questions are invalid,
    ///   or the module belongs to another course
    /// - `NotFound` if the course doesn't exist
    /// - `Forbidden` if `user` may not edit the course
    pub async fn create_lesson(&self, user: &User, input: CreateLessonInput) -> Result<Lesson, ServiceError> {
        let mut validator = Validator::new();
        validator.required(&input.title, "title");
        check_video_duration(&mut validator, input.video_duration);
        check_questions(&mut validator, &input.questions);
        validator.finish()?;

        self.owned_course(user, input.course_id).await?;
        self.check_module_in_course(input.module_id, input.course_id).await?;

        let now = Utc::now();
        let lesson = self
            .lessons
            .create(&Lesson {
                id: 0,
                course_id: input.course_id,
                module_id: input.module_id,
                title: input.title.trim().to_string(),
                title_bn: input.title_bn,
                order: input.order,
                video_url: input.video_url,
                video_duration: input.video_duration,
                text_content: input.text_content,
                text_blocks: input.text_blocks,
                documents: input.documents,
                questions: input.questions,
                is_free: input.is_free,
                created_at: now,
                updated_at: now,
            })
            .await?;

        invalidate_course_content(&self.cache, lesson.course_id).await;
        tracing::info!(lesson_id = lesson.id, course_id = lesson.course_id, "Lesson created");
        Ok(lesson)
    }

    /// Update a lesson; moving it to another module keeps it in its course
    ///
    /// # Errors
    /// - `NotFound` if the lesson doesn't exist
    /// - `Forbidden` if `user` may not edit the course
    /// - `Validation` if a changed field is invalid
    pub async fn update_lesson(&self, user: &User, id: i64, input: UpdateLessonInput) -> Result<Lesson, ServiceError> {
        let mut lesson = self.lesson(id).await?;
        self.owned_course(user, lesson.course_id).await?;

        let mut validator = Validator::new();
        if let Some(title) = &input.title {
            validator.required(title, "title");
        }
        check_video_duration(&mut validator, input.video_duration);
        if let Some(questions) = &input.questions {
            check_questions(&mut validator, questions);
        }
        validator.finish()?;

        if let Some(module_id) = input.module_id {
            if module_id != lesson.module_id {
                self.check_module_in_course(module_id, lesson.course_id).await?;
                lesson.module_id = module_id;
            }
        }
        if let Some(title) = input.title {
            lesson.title = title.trim().to_string();
        }
        if input.title_bn.is_some() {
            lesson.title_bn = input.title_bn;
        }
        if let Some(order) = input.order {
            lesson.order = order;
        }
        if input.video_url.is_some() {
            lesson.video_url = input.video_url;
        }
        if input.video_duration.is_some() {
            lesson.video_duration = input.video_duration;
        }
        if input.text_content.is_some() {
            lesson.text_content = input.text_content;
        }
        if let Some(blocks) = input.text_blocks {
            lesson.text_blocks = blocks;
        }
        if let Some(documents) = input.documents {
            lesson.documents = documents;
        }
        if let Some(questions) = input.questions {
            lesson.questions = questions;
        }
        if let Some(is_free) = input.is_free {
            lesson.is_free = is_free;
        }

        let lesson = self.lessons.update(&lesson).await?;
        invalidate_course_content(&self.cache, lesson.course_id).await;
        Ok(lesson)
    }

    pub async fn delete_lesson(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let lesson = self.lesson(id).await?;
        self.owned_course(user, lesson.course_id).await?;

        self.lessons.delete(id).await?;
        invalidate_course_content(&self.cache, lesson.course_id).await;
        Ok(())
    }

    async fn check_module_in_course(&self, module_id: i64, course_id: i64) -> Result<(), ServiceError> {
        match self.modules.get_by_id(module_id).await? {
            Some(module) if module.course_id == course_id => Ok(()),
            Some(_) => Err(ServiceError::invalid("module", "module belongs to a different course")),
            None => Err(ServiceError::invalid("module", "module does not exist")),
        }
    }
}

fn check_video_duration(validator: &mut Validator, duration: Option<i64>) {
    if let Some(seconds) = duration {
        validator.check(seconds >= 0, "videoDuration", "videoDuration must not be negative");
    }
}

/// Quiz questions need text, at least two options and an answer among them
fn check_questions(validator: &mut Validator, questions: &[Question]) {
    for (i, q) in questions.iter().enumerate() {
        validator.check(
            !q.question.trim().is_empty(),
            &format!("questions[{}].question", i),
            "question text is required",
        );
        validator.check(
            q.options.len() >= 2,
            &format!("questions[{}].options", i),
            "a question needs at least two options",
        );
        validator.check(
            q.correct_index < q.options.len(),
            &format!("questions[{}].correctIndex", i),
            "correctIndex must point at one of the options",
        );
    }
}

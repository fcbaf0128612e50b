//! Course service
//!
//! Implements the course catalog:
//! - Listing with search, filters and sorting
//! - Ownership rules (mentors edit their own courses, admins edit all)
//! - The cached content bundle learners read a course through

use crate::cache::{course_content_key, Cache, CacheLayer};
use crate::curriculum;
use crate::db::repositories::{
    CategoryRepository, CourseModuleRepository, CourseRepository, LessonRepository,
    ProgressRepository,
};
use crate::models::{
    CatalogFilter, Course, CourseContent, CourseDetail, CreateCourseInput, ListParams,
    PagedResult, PublishStatus, UpdateCourseInput, User,
};
use crate::services::error::{resolve_slug, ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

/// Whether `user` may modify `course`
pub(crate) fn authorize_course_edit(user: &User, course: &Course) -> Result<(), ServiceError> {
    if user.is_staff() && user.can_edit(course.mentor_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only the course mentor or an admin can modify this course".to_string(),
        ))
    }
}

/// Unpublished courses are only visible to those who may edit them
pub(crate) fn ensure_course_visible(course: &Course, viewer: Option<&User>) -> Result<(), ServiceError> {
    let visible = course.status == PublishStatus::Published
        || viewer.is_some_and(|u| u.is_staff() && u.can_edit(course.mentor_id));
    if visible {
        Ok(())
    } else {
        Err(ServiceError::not_found("Course"))
    }
}

/// Limit a catalog filter to what the viewer may list.
///
/// Everyone sees published items. Staff may ask for another status; admins
/// then get every owner's items, mentors only their own.
pub fn scope_filter(mut filter: CatalogFilter, viewer: Option<&User>) -> CatalogFilter {
    filter.owner_id = None;
    match (filter.status, viewer) {
        (Some(status), Some(user)) if status != PublishStatus::Published && user.is_staff() => {
            if !user.is_admin() {
                filter.owner_id = Some(user.id);
            }
        }
        _ => filter.status = Some(PublishStatus::Published),
    }
    filter
}

/// Drop the cached content bundle of a course
pub(crate) async fn invalidate_course_content(cache: &Cache, course_id: i64) {
    if let Err(e) = cache.delete(&course_content_key(course_id)).await {
        tracing::warn!(course_id, error = %e, "Failed to invalidate course content cache");
    }
}

pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    modules: Arc<dyn CourseModuleRepository>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    categories: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        modules: Arc<dyn CourseModuleRepository>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        categories: Arc<dyn CategoryRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            courses,
            modules,
            lessons,
            progress,
            categories,
            cache,
        }
    }

    /// List courses visible to `viewer`
    ///
    /// # Arguments
    /// * `filter` - Search, sort and filter options from the query string
    /// * `params` - Page and page size
    /// * `viewer` - Signed-in user, if any; decides which statuses may be listed
    ///
    /// # Returns
    /// One page of courses with the total match count
    pub async fn list(
        &self,
        filter: CatalogFilter,
        params: &ListParams,
        viewer: Option<&User>,
    ) -> Result<PagedResult<Course>, ServiceError> {
        let filter = scope_filter(filter, viewer);
        let (courses, total) = self.courses.list(&filter, params).await?;
        Ok(PagedResult::new(courses, total, params))
    }

    /// Load a course or fail with `NotFound`
    pub async fn get(&self, id: i64) -> Result<Course, ServiceError> {
        self.courses
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course"))
    }

    /// Course with its module and lesson counts
    ///
    /// # Errors
    /// - `NotFound` if the course doesn't exist or is hidden from `viewer`
    pub async fn detail(&self, id: i64, viewer: Option<&User>) -> Result<CourseDetail, ServiceError> {
        let course = self.get(id).await?;
        ensure_course_visible(&course, viewer)?;
        let (module_count, lesson_count) = self.courses.curriculum_counts(id).await?;
        Ok(CourseDetail {
            course,
            module_count,
            lesson_count,
        })
    }

    /// Create a new course
    ///
    /// Mentors always own what they create; admins may name another mentor.
    ///
    /// # Arguments
    /// * `user` - The creating mentor or admin
    /// * `input` - Course creation input
    ///
    /// # Returns
    /// The created course
    ///
    /// # Errors
    /// - `Forbidden` if `user` is neither mentor nor admin
    /// - `Validation` if the title is empty or the prices are inconsistent
    /// - `Conflict` if the slug already exists
    pub async fn create(&self, user: &User, input: CreateCourseInput) -> Result<Course, ServiceError> {
        if !user.is_staff() {
            return Err(ServiceError::Forbidden("Only mentors and admins can create courses".to_string()));
        }

        Validator::new()
            .required(&input.title, "title")
            .price(input.price, input.discount_price)
            .finish()?;

        let slug = resolve_slug(input.slug.as_deref(), &input.title)?;
        if self.courses.exists_by_slug(&slug).await? {
            return Err(ServiceError::Conflict(format!("Course slug '{}' already exists", slug)));
        }
        self.check_category(input.category_id).await?;

        let mentor_id = if user.is_admin() {
            input.mentor_id.or(Some(user.id))
        } else {
            Some(user.id)
        };

        let now = Utc::now();
        let course = self
            .courses
            .create(&Course {
                id: 0,
                slug,
                title: input.title.trim().to_string(),
                title_bn: input.title_bn,
                description: input.description,
                thumbnail: input.thumbnail,
                price: input.price,
                discount_price: input.discount_price,
                status: input.status,
                is_featured: input.is_featured,
                is_popular: input.is_popular,
                category_id: input.category_id,
                mentor_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(course_id = course.id, mentor_id = ?course.mentor_id, "Course created");
        Ok(course)
    }

    /// Update a course
    ///
    /// # Arguments
    /// * `user` - The editing user
    /// * `id` - Course ID to update
    /// * `input` - Fields to change; absent fields keep their value
    ///
    /// # Returns
    /// The updated course
    ///
    /// # Errors
    /// - `NotFound` if the course doesn't exist
    /// - `Forbidden` if `user` is not the mentor or an admin
    /// - `Validation` if the new title or prices are invalid
    /// - `Conflict` if the new slug already exists
    pub async fn update(&self, user: &User, id: i64, input: UpdateCourseInput) -> Result<Course, ServiceError> {
        let mut course = self.get(id).await?;
        authorize_course_edit(user, &course)?;

        let mut validator = Validator::new();
        if let Some(title) = &input.title {
            validator.required(title, "title");
        }
        let price = input.price.unwrap_or(course.price);
        let discount = input.discount_price.unwrap_or(course.discount_price);
        validator.price(price, discount).finish()?;

        if let Some(slug) = input.slug.as_deref() {
            let slug = resolve_slug(Some(slug), &course.title)?;
            if slug != course.slug && self.courses.exists_by_slug(&slug).await? {
                return Err(ServiceError::Conflict(format!("Course slug '{}' already exists", slug)));
            }
            course.slug = slug;
        }
        if let Some(category_id) = input.category_id {
            self.check_category(category_id).await?;
            course.category_id = category_id;
        }

        if let Some(title) = input.title {
            course.title = title.trim().to_string();
        }
        if input.title_bn.is_some() {
            course.title_bn = input.title_bn;
        }
        if let Some(description) = input.description {
            course.description = description;
        }
        if input.thumbnail.is_some() {
            course.thumbnail = input.thumbnail;
        }
        course.price = price;
        course.discount_price = discount;
        if let Some(status) = input.status {
            course.status = status;
        }
        if let Some(featured) = input.is_featured {
            course.is_featured = featured;
        }
        if let Some(popular) = input.is_popular {
            course.is_popular = popular;
        }

        let updated = self.courses.update(&course).await?;
        invalidate_course_content(&self.cache, id).await;
        Ok(updated)
    }

    /// Delete a course with its modules, lessons and completions
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let course = self.get(id).await?;
        authorize_course_edit(user, &course)?;

        self.courses.delete(id).await?;
        invalidate_course_content(&self.cache, id).await;
        tracing::info!(course_id = id, "Course deleted");
        Ok(())
    }

    /// Course, modules, lessons and grouped curriculum, plus the viewer's
    /// completed lessons.
    ///
    /// The viewer-independent part is cached per course.
    ///
    /// # Errors
    /// - `NotFound` if the course doesn't exist or is hidden from `viewer`
    pub async fn content(&self, id: i64, viewer: Option<&User>) -> Result<CourseContent, ServiceError> {
        let key = course_content_key(id);

        let lookup: anyhow::Result<Option<CourseContent>> = self.cache.get(&key).await;
        let cached = match lookup {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(course_id = id, error = %e, "Course content cache read failed");
                None
            }
        };

        let mut content = match cached {
            Some(content) => content,
            None => {
                // Read before loading so a write that lands meanwhile keeps
                // this copy out of the cache
                let generation = self.cache.generation();
                let content = self.load_content(id).await?;
                match self
                    .cache
                    .set_unless_invalidated(&key, &content, self.cache.default_ttl(), generation)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(course_id = id, "Course changed while loading content, not cached");
                    }
                    Err(e) => {
                        tracing::warn!(course_id = id, error = %e, "Course content cache write failed");
                    }
                }
                content
            }
        };

        ensure_course_visible(&content.course, viewer)?;

        if let Some(user) = viewer {
            content.completed_lessons = self.progress.completed_lessons(user.id, id).await?;
        }
        Ok(content)
    }

    async fn load_content(&self, id: i64) -> Result<CourseContent, ServiceError> {
        let course = self.get(id).await?;
        let modules = self.modules.list_by_course(id).await?;
        let lessons = self.lessons.list_by_course(id).await?;

        let grouped = curriculum::group(&modules, &lessons);
        if grouped.lesson_count() != lessons.len() {
            tracing::warn!(
                course_id = id,
                grouped = grouped.lesson_count(),
                total = lessons.len(),
                "Some lessons reference no module of their course"
            );
        }

        Ok(CourseContent {
            course,
            modules,
            lessons,
            curriculum: grouped.into_sections(),
            completed_lessons: Vec::new(),
        })
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

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::test_support::{insert_lesson, insert_module, insert_user, migrated_pool};
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxCourseModuleRepository, SqlxCourseRepository,
        SqlxLessonRepository, SqlxProgressRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::DynDatabasePool;
    use crate::models::UserRole;

    pub(crate) fn course_service(pool: &DynDatabasePool, cache: Arc<Cache>) -> CourseService {
        CourseService::new(
            SqlxCourseRepository::boxed(pool.clone()),
            SqlxCourseModuleRepository::boxed(pool.clone()),
            SqlxLessonRepository::boxed(pool.clone()),
            SqlxProgressRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            cache,
        )
    }

    pub(crate) async fn user_with_role(pool: &DynDatabasePool, email: &str, role: UserRole) -> User {
        let id = insert_user(pool, email, role.as_str()).await;
        SqlxUserRepository::new(pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .expect("user")
    }

    fn input(title: &str, price: f64) -> CreateCourseInput {
        CreateCourseInput {
            title: title.to_string(),
            price,
            status: PublishStatus::Published,
            ..CreateCourseInput::default()
        }
    }

    #[tokio::test]
    async fn test_mentor_owns_created_course() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let mentor = user_with_role(&pool, "m@example.com", UserRole::Mentor).await;

        let course = service.create(&mentor, input("Rust Basics", 20.0)).await.unwrap();
        assert_eq!(course.mentor_id, Some(mentor.id));
        assert_eq!(course.slug, "rust-basics");
    }

    #[tokio::test]
    async fn test_plain_user_cannot_create() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let learner = user_with_role(&pool, "u@example.com", UserRole::User).await;

        let err = service.create(&learner, input("Rust", 1.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_validation_and_duplicate_slug() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let admin = user_with_role(&pool, "a@example.com", UserRole::Admin).await;

        let mut bad = input("", -5.0);
        bad.discount_price = Some(10.0);
        match service.create(&admin, bad).await.unwrap_err() {
            ServiceError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }

        service.create(&admin, input("Go", 5.0)).await.unwrap();
        let err = service.create(&admin, input("go", 5.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_updates() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let owner = user_with_role(&pool, "owner@example.com", UserRole::Mentor).await;
        let other = user_with_role(&pool, "other@example.com", UserRole::Mentor).await;
        let admin = user_with_role(&pool, "admin@example.com", UserRole::Admin).await;

        let course = service.create(&owner, input("Rust", 20.0)).await.unwrap();
        let change = UpdateCourseInput {
            discount_price: Some(Some(15.0)),
            ..UpdateCourseInput::default()
        };

        let err = service.update(&other, course.id, change.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = service.update(&admin, course.id, change).await.unwrap();
        assert_eq!(updated.effective_price(), 15.0);

        let too_cheap = UpdateCourseInput {
            price: Some(10.0),
            ..UpdateCourseInput::default()
        };
        assert!(matches!(
            service.update(&owner, course.id, too_cheap).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_public() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let mentor = user_with_role(&pool, "m@example.com", UserRole::Mentor).await;

        let mut draft = input("Draft", 1.0);
        draft.status = PublishStatus::Draft;
        let draft = service.create(&mentor, draft).await.unwrap();
        service.create(&mentor, input("Live", 1.0)).await.unwrap();

        let public = service
            .list(CatalogFilter::default(), &ListParams::default(), None)
            .await
            .unwrap();
        assert_eq!(public.total, 1);

        let staff_filter = CatalogFilter {
            status: Some(PublishStatus::Draft),
            ..CatalogFilter::default()
        };
        let staff = service
            .list(staff_filter, &ListParams::default(), Some(&mentor))
            .await
            .unwrap();
        assert_eq!(staff.items[0].id, draft.id);

        assert!(matches!(service.detail(draft.id, None).await, Err(ServiceError::NotFound(_))));
        assert!(service.detail(draft.id, Some(&mentor)).await.is_ok());
    }

    #[tokio::test]
    async fn test_content_is_grouped_and_cached() {
        let pool = migrated_pool().await;
        let cache = create_cache(&CacheConfig::default());
        let service = course_service(&pool, cache.clone());
        let mentor = user_with_role(&pool, "m@example.com", UserRole::Mentor).await;
        let course = service.create(&mentor, input("Rust", 1.0)).await.unwrap();

        let second = insert_module(&pool, course.id, 2).await;
        let first = insert_module(&pool, course.id, 1).await;
        insert_lesson(&pool, course.id, second, 1).await;
        insert_lesson(&pool, course.id, first, 2).await;
        insert_lesson(&pool, course.id, first, 1).await;

        let content = service.content(course.id, None).await.unwrap();
        assert_eq!(content.curriculum.len(), 2);
        assert_eq!(content.curriculum[0].module.id, first);
        assert_eq!(content.curriculum[0].lessons.len(), 2);
        assert!(content.completed_lessons.is_empty());

        let cached: Option<CourseContent> = cache.get(&course_content_key(course.id)).await.unwrap();
        assert!(cached.is_some());

        service
            .update(&mentor, course.id, UpdateCourseInput::default())
            .await
            .unwrap();
        let cached: Option<CourseContent> = cache.get(&course_content_key(course.id)).await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_update_can_clear_discount_and_category() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let mentor = user_with_role(&pool, "m@example.com", UserRole::Mentor).await;
        let category_id = sqlx::query("INSERT INTO categories (slug, name) VALUES ('systems', 'Systems')")
            .execute(pool.pool())
            .await
            .unwrap()
            .last_insert_rowid();

        let mut create = input("Rust", 20.0);
        create.discount_price = Some(12.0);
        create.category_id = Some(category_id);
        let course = service.create(&mentor, create).await.unwrap();

        // Absent fields are left alone
        let untouched = service
            .update(&mentor, course.id, UpdateCourseInput::default())
            .await
            .unwrap();
        assert_eq!(untouched.discount_price, Some(12.0));
        assert_eq!(untouched.category_id, Some(category_id));

        let change: UpdateCourseInput =
            serde_json::from_value(serde_json::json!({ "discountPrice": null, "categoryId": null })).unwrap();
        let cleared = service.update(&mentor, course.id, change).await.unwrap();
        assert_eq!(cleared.discount_price, None);
        assert_eq!(cleared.category_id, None);
        assert_eq!(cleared.effective_price(), 20.0);
    }

    #[tokio::test]
    async fn test_mentor_lists_only_own_drafts() {
        let pool = migrated_pool().await;
        let service = course_service(&pool, create_cache(&CacheConfig::default()));
        let owner = user_with_role(&pool, "owner@example.com", UserRole::Mentor).await;
        let other = user_with_role(&pool, "other@example.com", UserRole::Mentor).await;
        let admin = user_with_role(&pool, "admin@example.com", UserRole::Admin).await;

        let mut draft = input("Unreleased", 1.0);
        draft.status = PublishStatus::Draft;
        let draft = service.create(&owner, draft).await.unwrap();

        let drafts = || CatalogFilter {
            status: Some(PublishStatus::Draft),
            ..CatalogFilter::default()
        };
        let params = ListParams::default();

        let seen_by_other = service.list(drafts(), &params, Some(&other)).await.unwrap();
        assert_eq!(seen_by_other.total, 0);
        assert!(seen_by_other.items.is_empty());

        let seen_by_owner = service.list(drafts(), &params, Some(&owner)).await.unwrap();
        assert_eq!(seen_by_owner.total, 1);
        assert_eq!(seen_by_owner.items[0].id, draft.id);

        let seen_by_admin = service.list(drafts(), &params, Some(&admin)).await.unwrap();
        assert_eq!(seen_by_admin.total, 1);
    }

    #[tokio::test]
    async fn test_scope_filter() {
        let pool = migrated_pool().await;
        let mentor = user_with_role(&pool, "m@example.com", UserRole::Mentor).await;
        let admin = user_with_role(&pool, "a@example.com", UserRole::Admin).await;
        let learner = user_with_role(&pool, "u@example.com", UserRole::User).await;
        let drafts = CatalogFilter {
            status: Some(PublishStatus::Draft),
            // Never taken from the caller
            owner_id: Some(999),
            ..CatalogFilter::default()
        };

        let public = scope_filter(drafts.clone(), None);
        assert_eq!(public.status, Some(PublishStatus::Published));
        assert_eq!(public.owner_id, None);
        assert_eq!(
            scope_filter(drafts.clone(), Some(&learner)).status,
            Some(PublishStatus::Published)
        );
        assert_eq!(
            scope_filter(CatalogFilter::default(), Some(&admin)).status,
            Some(PublishStatus::Published)
        );

        let own = scope_filter(drafts.clone(), Some(&mentor));
        assert_eq!(own.status, Some(PublishStatus::Draft));
        assert_eq!(own.owner_id, Some(mentor.id));

        let all = scope_filter(drafts, Some(&admin));
        assert_eq!(all.status, Some(PublishStatus::Draft));
        assert_eq!(all.owner_id, None);
    }
}

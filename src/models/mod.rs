//! Data models
//!
//! Database entities, request inputs and response shapes for the
//! MotionBoss API. Everything that crosses the wire is camelCase.

mod blog;
mod category;
mod course;
mod course_module;
mod lesson;
mod listing;
mod product;
mod progress;
mod review;
mod session;
mod user;

pub use blog::{Blog, BlogComment, CreateBlogInput, CreateCommentInput, UpdateBlogInput};
pub use category::{Category, CategoryKind, CreateCategoryInput};
pub use course::{Course, CourseContent, CourseDetail, CreateCourseInput, UpdateCourseInput};
pub use course_module::{CourseModule, CreateModuleInput, UpdateModuleInput};
pub use lesson::{CreateLessonInput, Lesson, LessonDocument, Question, TextBlock, UpdateLessonInput};
pub use listing::{CatalogFilter, ListParams, PagedResult, PublishStatus, SortOrder};
pub use product::{CreateProductInput, Product, ProductKind, UpdateProductInput};
pub use progress::{CompleteLessonInput, CourseProgress};
pub use review::{
    CreateReviewInput, Favorite, ProductType, Review, ReviewStatus, ReviewSummary,
    ToggleFavoriteInput,
};
pub use session::{AuthPayload, Session};
pub use user::{gravatar_url, LoginInput, NewUser, RegisterInput, User, UserRole, UserStatus};

//! Services layer - Business logic
//!
//! Services enforce the marketplace rules on top of the repositories:
//! - ownership and role checks
//! - field validation, reported per field
//! - cache invalidation for course content

pub mod blog;
pub mod category;
pub mod course;
pub mod curriculum;
pub mod error;
pub mod favorite;
pub mod password;
pub mod product;
pub mod progress;
pub mod review;
pub mod user;

pub use blog::{sanitize_comment, sanitize_html, BlogService};
pub use category::CategoryService;
pub use course::{scope_filter, CourseService};
pub use curriculum::CurriculumService;
pub use error::{generate_slug, FieldError, ServiceError, Validator};
pub use favorite::{FavoriteService, FavoriteToggle};
pub use password::{hash_password, verify_password};
pub use product::ProductService;
pub use progress::ProgressService;
pub use review::{ProductLookup, ReviewService};
pub use user::{UserService, UserServiceError, DEFAULT_SESSION_DAYS};

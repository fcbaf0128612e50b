//! HTTP client for the MotionBoss API
//!
//! [`ApiClient`] wraps the REST endpoints and unpacks the response
//! envelope into typed results. [`CourseProgress`] lets a
//! [`LessonCursor`](crate::curriculum::LessonCursor) record completions
//! through the API, and [`ClientStore`] keeps the session and cart on disk.

mod api;
mod error;
mod progress;
mod store;

pub use api::{ApiClient, CourseContentDocs, ListPage, ListQuery, MAX_COMMENT_CHARS};
pub use error::ClientError;
pub use progress::CourseProgress;
pub use store::{CartItem, ClientStore};

//! Review service
//!
//! Learners leave one review per product. Reviews start pending and only
//! approved ones are shown publicly.

use crate::db::repositories::{CourseRepository, ProductRepository, ReviewRepository};
use crate::models::{
    CreateReviewInput, ListParams, PagedResult, ProductType, PublishStatus, Review, ReviewStatus,
    ReviewSummary, User,
};
use crate::services::blog::sanitize_comment;
use crate::services::error::{ServiceError, Validator};
use chrono::Utc;
use std::sync::Arc;

/// Looks up the products that reviews and favorites point at
#[derive(Clone)]
pub struct ProductLookup {
    courses: Arc<dyn CourseRepository>,
    products: Arc<dyn ProductRepository>,
}

impl ProductLookup {
    pub fn new(courses: Arc<dyn CourseRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { courses, products }
    }

    /// Whether a published product exists under this type and id
    pub async fn exists(&self, product_type: ProductType, product_id: i64) -> Result<bool, ServiceError> {
        let status = match product_type.product_kind() {
            None => self
                .courses
                .get_by_id(product_id)
                .await?
                .map(|course| course.status),
            Some(kind) => self
                .products
                .get_by_kind(kind, product_id)
                .await?
                .map(|product| product.status),
        };
        Ok(status == Some(PublishStatus::Published))
    }

    pub async fn require(&self, product_type: ProductType, product_id: i64) -> Result<(), ServiceError> {
        if self.exists(product_type, product_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Product"))
        }
    }
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    lookup: ProductLookup,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, lookup: ProductLookup) -> Self {
        Self { reviews, lookup }
    }

    pub async fn create(&self, user: &User, input: CreateReviewInput) -> Result<Review, ServiceError> {
        let comment = sanitize_comment(&input.comment);
        Validator::new()
            .check(
                (1..=5).contains(&input.rating),
                "rating",
                "rating must be between 1 and 5",
            )
            .check(comment.chars().count() <= 2000, "comment", "comment is too long")
            .finish()?;

        self.lookup.require(input.product_type, input.product_id).await?;

        if self
            .reviews
            .find_by_user(input.product_type, input.product_id, user.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "You have already reviewed this product".to_string(),
            ));
        }

        let now = Utc::now();
        let review = self
            .reviews
            .create(&Review {
                id: 0,
                product_type: input.product_type,
                product_id: input.product_id,
                user_id: user.id,
                rating: input.rating,
                comment,
                status: ReviewStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            review_id = review.id,
            product_type = %review.product_type,
            product_id = review.product_id,
            "Review submitted"
        );
        Ok(review)
    }

    /// Approved reviews of one product with their average rating
    pub async fn summary(&self, product_type: ProductType, product_id: i64) -> Result<ReviewSummary, ServiceError> {
        let reviews = self.reviews.list_approved(product_type, product_id).await?;
        Ok(ReviewSummary::new(reviews))
    }

    pub async fn list(
        &self,
        user: &User,
        status: Option<ReviewStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Review>, ServiceError> {
        require_admin(user)?;
        let (items, total) = self.reviews.list(status, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn moderate(&self, user: &User, id: i64, status: ReviewStatus) -> Result<Review, ServiceError> {
        require_admin(user)?;
        if !self.reviews.update_status(id, status).await? {
            return Err(ServiceError::not_found("Review"));
        }
        self.reviews
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review"))
    }
}

fn require_admin(user: &User) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Only admins can moderate reviews".to_string()))
    }
}

//! Review and favorite models
//!
//! Both point at a product by `(productType, productId)`, where the
//! product is a course, a software or a website.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ProductKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Course,
    Software,
    Website,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Course => "course",
            ProductType::Software => "software",
            ProductType::Website => "website",
        }
    }

    /// The product table kind, `None` for courses
    pub fn product_kind(&self) -> Option<ProductKind> {
        match self {
            ProductType::Course => None,
            ProductType::Software => Some(ProductKind::Software),
            ProductType::Website => Some(ProductKind::Website),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course" => Ok(ProductType::Course),
            "software" => Ok(ProductType::Software),
            "website" => Ok(ProductType::Website),
            _ => Err(anyhow::anyhow!("Invalid product type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid review status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub product_type: ProductType,
    pub product_id: i64,
    pub user_id: i64,
    /// 1 to 5
    pub rating: i64,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Approved reviews of one product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub reviews: Vec<Review>,
    pub total: i64,
    /// Mean rating rounded to one decimal, 0 with no reviews
    pub average_rating: f64,
}

impl ReviewSummary {
    pub fn new(reviews: Vec<Review>) -> Self {
        let total = reviews.len() as i64;
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            let sum: i64 = reviews.iter().map(|r| r.rating).sum();
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };
        Self {
            reviews,
            total,
            average_rating,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    pub product_type: ProductType,
    pub product_id: i64,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub product_type: ProductType,
    pub product_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteInput {
    pub product_type: ProductType,
    pub product_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i64) -> Review {
        let now = Utc::now();
        Review {
            id: rating,
            product_type: ProductType::Course,
            product_id: 1,
            user_id: rating,
            rating,
            comment: String::new(),
            status: ReviewStatus::Approved,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(ReviewSummary::new(vec![]).average_rating, 0.0);

        let summary = ReviewSummary::new(vec![review(5), review(4), review(4)]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.average_rating, 4.3);
    }

    #[test]
    fn test_product_type_kind() {
        assert_eq!(ProductType::Course.product_kind(), None);
        assert_eq!(ProductType::Website.product_kind(), Some(ProductKind::Website));
        assert_eq!(ProductType::from_str("SOFTWARE").unwrap(), ProductType::Software);
    }
}

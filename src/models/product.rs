//! Digital product model (software and website templates)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::listing::PublishStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Software,
    Website,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Software => "software",
            ProductKind::Website => "website",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "software" => Ok(ProductKind::Software),
            "website" => Ok(ProductKind::Website),
            _ => Err(anyhow::anyhow!("Invalid product kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub kind: ProductKind,
    pub slug: String,
    pub title: String,
    pub title_bn: Option<String>,
    pub description: String,
    pub thumbnail: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub preview_url: Option<String>,
    pub status: PublishStatus,
    pub is_featured: bool,
    pub is_popular: bool,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub title: String,
    #[serde(default)]
    pub title_bn: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub title_bn: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub price: Option<f64>,
    /// Explicit `null` clears the discount
    #[serde(default, deserialize_with = "super::listing::nullable")]
    pub discount_price: Option<Option<f64>>,
    pub preview_url: Option<String>,
    pub status: Option<PublishStatus>,
    pub is_featured: Option<bool>,
    pub is_popular: Option<bool>,
    /// Explicit `null` clears the category
    #[serde(default, deserialize_with = "super::listing::nullable")]
    pub category_id: Option<Option<i64>>,
}

//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which catalog a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    #[default]
    Course,
    Blog,
    Product,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Course => "course",
            CategoryKind::Blog => "blog",
            CategoryKind::Product => "product",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course" => Ok(CategoryKind::Course),
            "blog" => Ok(CategoryKind::Blog),
            "product" => Ok(CategoryKind::Product),
            _ => Err(anyhow::anyhow!("Invalid category kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub name_bn: Option<String>,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    pub name: String,
    #[serde(default)]
    pub name_bn: Option<String>,
    /// Generated from `name` when absent
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub kind: CategoryKind,
}

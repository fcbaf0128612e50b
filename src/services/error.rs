//! Errors shared by the content services
//!
//! Validation failures carry every offending field so the API can report
//! them all at once.

use serde::{Deserialize, Serialize};

/// One failing input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Error type for catalog and content services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Validation error for a single field
    pub fn invalid(path: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::new(path, message)])
    }
}

/// Collects field errors while checking an input
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `path` unless `ok`
    pub fn check(&mut self, ok: bool, path: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(path, message));
        }
        self
    }

    /// Require a non-blank string
    pub fn required(&mut self, value: &str, path: &str) -> &mut Self {
        let ok = !value.trim().is_empty();
        self.check(ok, path, &format!("{} is required", path))
    }

    /// Require a non-negative price with an optional discount not above it
    pub fn price(&mut self, price: f64, discount: Option<f64>) -> &mut Self {
        self.check(price.is_finite() && price >= 0.0, "price", "price must not be negative");
        if let Some(discount) = discount {
            self.check(
                discount.is_finite() && discount >= 0.0,
                "discountPrice",
                "discountPrice must not be negative",
            );
            self.check(discount <= price, "discountPrice", "discountPrice must not exceed price");
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Lowercased, hyphen-separated slug; non-ASCII letters are kept
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_hyphen = true;

    for c in name.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slug from an explicit value or a title, failing on an empty result
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String, ServiceError> {
    let source = explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(title);
    let slug = generate_slug(source);
    if slug.is_empty() {
        return Err(ServiceError::invalid("slug", "slug could not be derived"));
    }
    Ok(slug)
}

//! User model
//!
//! Accounts come in three roles. Admins manage everything, mentors own
//! the courses and blogs they create, and users learn, comment, review
//! and keep favorites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Email address (unique, stored lowercase)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Avatar URL; a Gravatar URL is derived from the email when absent
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins and mentors may author courses and blogs
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Mentor)
    }

    /// Admins may edit anything, everyone else only what they own
    pub fn can_edit(&self, owner_id: Option<i64>) -> bool {
        self.is_admin() || owner_id == Some(self.id)
    }

    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }

    /// The stored avatar, or a Gravatar URL for the email
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(url) if !url.is_empty() => url.clone(),
            _ => gravatar_url(&self.email),
        }
    }
}

/// Gravatar URL for an email address, falling back to the mystery person
pub fn gravatar_url(email: &str) -> String {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return "https://www.gravatar.com/avatar/?d=mp&s=80".to_string();
    }
    let hash = format!("{:x}", md5::compute(email));
    format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Mentor,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Mentor => "mentor",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "mentor" => Ok(UserRole::Mentor),
            "user" => Ok(UserRole::User),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    /// Cannot log in; existing sessions are rejected
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "blocked" => Ok(UserStatus::Blocked),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Registration input (before password hashing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Row to insert for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Test".to_string(),
            email: "Test@Example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            status: UserStatus::Active,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_roles() {
        assert!(user(1, UserRole::Admin).is_staff());
        assert!(user(1, UserRole::Mentor).is_staff());
        assert!(!user(1, UserRole::User).is_staff());
        assert!(user(1, UserRole::Admin).is_admin());
        assert!(!user(1, UserRole::Mentor).is_admin());
    }

    #[test]
    fn test_can_edit() {
        let admin = user(1, UserRole::Admin);
        let mentor = user(2, UserRole::Mentor);

        assert!(admin.can_edit(Some(2)));
        assert!(admin.can_edit(None));
        assert!(mentor.can_edit(Some(2)));
        assert!(!mentor.can_edit(Some(1)));
        assert!(!mentor.can_edit(None));
    }

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [UserRole::Admin, UserRole::Mentor, UserRole::User] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert_eq!(UserRole::from_str("MENTOR").unwrap(), UserRole::Mentor);
        assert!(UserRole::from_str("editor").is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(1, UserRole::User)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_avatar_url_falls_back_to_gravatar() {
        let mut u = user(1, UserRole::User);
        let expected = format!(
            "https://www.gravatar.com/avatar/{:x}?d=mp&s=80",
            md5::compute("test@example.com")
        );
        assert_eq!(u.avatar_url(), expected);

        u.avatar = Some("https://cdn.example.com/me.png".to_string());
        assert_eq!(u.avatar_url(), "https://cdn.example.com/me.png");
    }
}

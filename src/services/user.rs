//! User service
//!
//! Implements account management:
//! - Registration (the first account becomes admin)
//! - Login and logout with bearer-token sessions
//! - Session validation for the auth middleware
//! - Role and status changes by admins

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{
    AuthPayload, ListParams, LoginInput, NewUser, PagedResult, RegisterInput, Session, User,
    UserRole, UserStatus,
};
use crate::services::error::FieldError;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;

/// Default session lifetime in days
pub const DEFAULT_SESSION_DAYS: i64 = 7;

const MIN_PASSWORD_LEN: usize = 6;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials or session
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The account is blocked
    #[error("Your account has been blocked")]
    Blocked,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Email already registered
    #[error("{0}")]
    UserExists(String),

    #[error("User not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_lifetime: Duration,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_days(user_repo, session_repo, DEFAULT_SESSION_DAYS)
    }

    pub fn with_session_days(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_lifetime: Duration::days(session_days.max(1)),
        }
    }

    /// Register an account and sign it in.
    ///
    /// The first account in an empty database becomes admin; later ones
    /// are plain users.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthPayload, UserServiceError> {
        validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email.trim()
            )));
        }

        let role = if self.user_repo.count().await? == 0 {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create(&NewUser {
                name: input.name.trim().to_string(),
                email: input.email.trim().to_string(),
                password_hash,
                role,
            })
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        let session = self.create_session(user.id).await?;
        Ok(AuthPayload {
            access_token: session.id,
            user,
        })
    }

    /// Verify credentials and open a session
    pub async fn login(&self, input: LoginInput) -> Result<AuthPayload, UserServiceError> {
        let invalid = || UserServiceError::AuthenticationError("Invalid email or password".to_string());

        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(invalid());
        }

        if user.is_blocked() {
            tracing::warn!(user_id = user.id, "Blocked user attempted to log in");
            return Err(UserServiceError::Blocked);
        }

        let session = self.create_session(user.id).await?;
        Ok(AuthPayload {
            access_token: session.id,
            user,
        })
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a token to its user.
    ///
    /// Unknown and expired tokens, and tokens of blocked users, yield `None`.
    /// Expired sessions are removed on the way.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self.session_repo.get_by_id(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Ok(None);
        }

        let user = self.user_repo.get_by_id(session.user_id).await?;
        Ok(user.filter(|u| !u.is_blocked()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<User>, UserServiceError> {
        let (users, total) = self.user_repo.list(params).await?;
        Ok(PagedResult::new(users, total, params))
    }

    pub async fn set_role(&self, id: i64, role: UserRole) -> Result<User, UserServiceError> {
        if !self.user_repo.update_role(id, role).await? {
            return Err(UserServiceError::NotFound);
        }
        tracing::info!(user_id = id, role = %role, "User role changed");
        self.get_by_id(id).await
    }

    /// Block or unblock an account; blocking ends all of its sessions
    pub async fn set_status(&self, id: i64, status: UserStatus) -> Result<User, UserServiceError> {
        if !self.user_repo.update_status(id, status).await? {
            return Err(UserServiceError::NotFound);
        }
        if status == UserStatus::Blocked {
            self.session_repo.delete_by_user(id).await?;
        }
        tracing::info!(user_id = id, status = %status, "User status changed");
        self.get_by_id(id).await
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self.session_repo.delete_expired().await?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::issue(user_id, self.session_lifetime);
        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

fn validate_register_input(input: &RegisterInput) -> Result<(), UserServiceError> {
    let mut errors = Vec::new();

    if input.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    if !is_valid_email(input.email.trim()) {
        errors.push(FieldError::new("email", "email is not a valid address"));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(UserServiceError::Validation(errors))
    }
}

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};

    async fn service() -> UserService {
        let pool = migrated_pool().await;
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            name: "Learner".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let service = service().await;

        let first = service.register(register_input("first@example.com")).await.unwrap();
        let second = service.register(register_input("second@example.com")).await.unwrap();

        assert_eq!(first.user.role, UserRole::Admin);
        assert_eq!(second.user.role, UserRole::User);
        assert!(!first.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_validation_reports_every_field() {
        let service = service().await;
        let err = service
            .register(RegisterInput {
                name: " ".to_string(),
                email: "not-an-email".to_string(),
                password: "123".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            UserServiceError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service().await;
        service.register(register_input("dup@example.com")).await.unwrap();

        let err = service.register(register_input("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::UserExists(_)));
    }

    #[tokio::test]
    async fn test_login_and_session_validation() {
        let service = service().await;
        service.register(register_input("learner@example.com")).await.unwrap();

        let wrong = service
            .login(LoginInput {
                email: "learner@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(UserServiceError::AuthenticationError(_))));

        let auth = service
            .login(LoginInput {
                email: "Learner@Example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let user = service.validate_session(&auth.access_token).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some(auth.user.id));

        service.logout(&auth.access_token).await.unwrap();
        assert!(service.validate_session(&auth.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blocked_user_cannot_log_in_and_loses_sessions() {
        let service = service().await;
        service.register(register_input("admin@example.com")).await.unwrap();
        let learner = service.register(register_input("learner@example.com")).await.unwrap();

        service.set_status(learner.user.id, UserStatus::Blocked).await.unwrap();

        assert!(service.validate_session(&learner.access_token).await.unwrap().is_none());
        let err = service
            .login(LoginInput {
                email: "learner@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Blocked));
    }

    #[tokio::test]
    async fn test_set_role_unknown_user() {
        let service = service().await;
        let err = service.set_role(999, UserRole::Mentor).await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound));
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.example.com"));
        assert!(!is_valid_email("missing-at.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@example"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@@example.com"));
    }
}

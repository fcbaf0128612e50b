//! User repository

use crate::db::DynDatabasePool;
use crate::models::{ListParams, NewUser, User, UserRole, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use super::parse_column;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, status, avatar, created_at, updated_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn count(&self) -> Result<i64>;

    /// List users, newest first, with the total count
    async fn list(&self, params: &ListParams) -> Result<(Vec<User>, i64)>;

    /// Returns false when the user does not exist
    async fn update_role(&self, id: i64, role: UserRole) -> Result<bool>;

    /// Returns false when the user does not exist
    async fn update_status(&self, id: i64, status: UserStatus) -> Result<bool>;
}

pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    async fn update_column(&self, id: i64, column: &str, value: &str) -> Result<bool> {
        let sql = format!("UPDATE users SET {} = ?, updated_at = ? WHERE id = ?", column);
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.pool())
            .await
            .with_context(|| format!("Failed to update user {}", column))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'active', ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: user.name.clone(),
            email: user.email.to_lowercase(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            status: UserStatus::Active,
            avatar: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get user by ID")?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get user by email")?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count users")
    }

    async fn list(&self, params: &ListParams) -> Result<(Vec<User>, i64)> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list users")?;

        let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;
        let total = self.count().await?;
        Ok((users, total))
    }

    async fn update_role(&self, id: i64, role: UserRole) -> Result<bool> {
        self.update_column(id, "role", role.as_str()).await
    }

    async fn update_status(&self, id: i64, status: UserStatus) -> Result<bool> {
        self.update_column(id, "status", status.as_str()).await
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role: String = row.get("role");
    let status: String = row.get("status");

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: parse_column(&role, "role")?,
        status: parse_column(&status, "status")?,
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Rahim".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let created = repo.create(&new_user("Rahim@Example.com", UserRole::Mentor)).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.email, "rahim@example.com");
        assert_eq!(created.role, UserRole::Mentor);
        assert_eq!(created.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let created = repo.create(&new_user("a@example.com", UserRole::User)).await.unwrap();

        let found = repo.get_by_email(" A@Example.COM ").await.unwrap().expect("user");
        assert_eq!(found.id, created.id);
        assert!(repo.get_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        repo.create(&new_user("a@example.com", UserRole::User)).await.unwrap();
        assert!(repo.create(&new_user("A@example.com", UserRole::User)).await.is_err());
    }

    #[tokio::test]
    async fn test_update_role_and_status() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        let created = repo.create(&new_user("a@example.com", UserRole::User)).await.unwrap();

        assert!(repo.update_role(created.id, UserRole::Mentor).await.unwrap());
        assert!(repo.update_status(created.id, UserStatus::Blocked).await.unwrap());
        assert!(!repo.update_role(999, UserRole::Admin).await.unwrap());

        let found = repo.get_by_id(created.id).await.unwrap().expect("user");
        assert_eq!(found.role, UserRole::Mentor);
        assert!(found.is_blocked());
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let repo = SqlxUserRepository::new(migrated_pool().await);
        for i in 0..5 {
            repo.create(&new_user(&format!("u{}@example.com", i), UserRole::User))
                .await
                .unwrap();
        }

        let (page, total) = repo.list(&ListParams::new(2, 2)).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].email, "u2@example.com");
    }
}

//! Database layer
//!
//! SQLite connection handling, embedded migrations and the repositories
//! that the services build on.
//!
//! # Usage
//!
//! ```ignore
//! use motionboss::config::DatabaseConfig;
//! use motionboss::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database, DynDatabasePool};

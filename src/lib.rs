//! MotionBoss - e-learning and digital-goods marketplace
//!
//! The crate serves the marketplace REST API over SQLite and ships a
//! typed client for it, together with the curriculum grouping and lesson
//! progression logic that course players build on.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod models;
pub mod services;

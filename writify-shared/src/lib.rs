//! # Writify Shared Library
//!
//! Shared types and business logic used across the Writify API server and
//! the retention worker.
//!
//! ## Module Organization
//!
//! - `db`: Connection pooling and migrations
//! - `models`: Database models and their CRUD operations
//! - `auth`: Google OAuth flow and session tokens
//! - `lifecycle`: The assignment request lifecycle (create, accept,
//!   complete, rate)
//! - `retention`: The data-retention sweep

pub mod auth;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod retention;

/// Current version of the Writify shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

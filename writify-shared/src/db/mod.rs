//! Database layer for Writify
//!
//! - `pool`: PostgreSQL connection pool management with a startup health
//!   check
//! - `migrations`: embedded migration runner
//!
//! Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;

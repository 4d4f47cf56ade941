//! Database models for Writify
//!
//! One module per relation:
//!
//! - `user`: accounts created on first Google sign-in
//! - `request`: assignment requests posted by clients
//! - `assignment`: the accepted writer/client pairing for a request
//! - `rating`: one mutable judgment per (rater, request) pair
//! - `portfolio`: at most one sample-work entry per writer

pub mod assignment;
pub mod portfolio;
pub mod rating;
pub mod request;
pub mod user;

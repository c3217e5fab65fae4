//! Document models for community posts, comments and diaries.
//!
//! # Responsibility
//! - Define the records shared by repositories and services.
//! - Keep external (document) field naming in serde attributes.
//!
//! # Invariants
//! - Every post and comment is identified by a stable uuid.
//! - Diaries are addressed by calendar date, never by their uuid.

pub mod comment;
pub mod diary;
pub mod post;

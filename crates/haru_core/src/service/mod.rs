//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Attach operation names and error kinds to failures.

pub mod comment_service;
pub mod diary_service;

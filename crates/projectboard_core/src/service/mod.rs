//! Core use-case services.
//!
//! # Responsibility
//! - Expose article use cases to presentation layers.
//! - Keep callers decoupled from storage details.

pub mod article_service;

//! Domain model for project-board articles.
//!
//! # Responsibility
//! - Define the records the store persists and hands back to callers.
//! - Keep identity and audit data out of caller control.
//!
//! # Invariants
//! - Every stored article is identified by a store-assigned `ArticleId`.
//! - Deleting an article removes the comments it owns.

pub mod article;

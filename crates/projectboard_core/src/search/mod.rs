//! Article search criteria and lazy result paging.
//!
//! # Responsibility
//! - Describe the four indexed query dimensions: title, hashtag, creation
//!   time and creator.
//! - Stream matches page by page without loading the full result set.

pub mod article_search;

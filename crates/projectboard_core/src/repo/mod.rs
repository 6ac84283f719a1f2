//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the storage-facing article contract consumed by services.
//! - Keep SQL and schema checks out of service orchestration.
//!
//! # Invariants
//! - Writes call `Article::validate()` and `AuditContext::validate()` first.
//! - Missing records surface as `RepoError::NotFound`, never as `Ok(None)`.

pub mod article_repo;

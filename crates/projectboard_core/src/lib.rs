//! Core data layer for the project board.
//! This crate owns article identity, field invariants, comment ownership and
//! audit stamping.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, CoreConfig, LogConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::{
    Article, ArticleComment, ArticleId, ArticlePatch, ArticleValidationError, AuditContext,
    AuditTrail, CommentId,
};
pub use repo::article_repo::{ArticleRepository, RepoError, RepoResult, SqliteArticleRepository};
pub use search::article_search::{ArticleSearch, ArticleSearchIter};
pub use service::article_service::ArticleService;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

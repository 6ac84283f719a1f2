//! Article use-case service.
//!
//! # Responsibility
//! - Provide the create/get/update/delete/search entry points callers use.
//! - Emit metadata-only log events for every write.
//!
//! # Invariants
//! - Repository errors are returned unchanged; nothing is retried or
//!   defaulted here.
//! - Article text never appears in log output.

use crate::model::article::{Article, ArticleComment, ArticleId, ArticlePatch, AuditContext};
use crate::repo::article_repo::{ArticleRepository, RepoError, RepoResult};
use crate::search::article_search::{ArticleSearch, ArticleSearchIter};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Use-case facade over an `ArticleRepository`.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and persists an article from the user-supplied fields.
    ///
    /// # Errors
    /// - `RepoError::Validation` for blank title/content, content over
    ///   10,000 characters, or an invalid actor.
    pub fn create_article(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        hashtag: Option<String>,
        ctx: &AuditContext,
    ) -> RepoResult<Article> {
        let started_at = Instant::now();
        let draft = Article::of(title, content, hashtag);
        let result = self.repo.create_article(&draft, ctx);
        log_write("article_create", started_at, &result, |article| {
            format!("article_id={}", article.id().unwrap_or_default())
        });
        result
    }

    /// Loads one article with comments ascending by comment id.
    pub fn get_article(&self, id: ArticleId) -> RepoResult<Article> {
        let result = self.repo.get_article(id);
        if let Err(err) = &result {
            debug!(
                "event=article_get module=service status=error article_id={id} error_code={}",
                err.code()
            );
        }
        result
    }

    /// Applies the supplied fields and re-stamps `modified_at`/`modified_by`.
    pub fn update_article(
        &self,
        id: ArticleId,
        patch: &ArticlePatch,
        ctx: &AuditContext,
    ) -> RepoResult<Article> {
        let started_at = Instant::now();
        let result = self.repo.update_article(id, patch, ctx);
        log_write("article_update", started_at, &result, |_| {
            format!("article_id={id} empty_patch={}", patch.is_empty())
        });
        result
    }

    /// Deletes an article and every comment it owns.
    pub fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_article(id);
        log_write("article_delete", started_at, &result, |_| {
            format!("article_id={id}")
        });
        result
    }

    /// Starts a lazy search over the indexed dimensions.
    pub fn search_articles(&self, criteria: &ArticleSearch) -> ArticleSearchIter<'_, R> {
        ArticleSearchIter::new(&self.repo, criteria)
    }

    /// Appends a comment to an existing article.
    pub fn add_comment(
        &self,
        article_id: ArticleId,
        content: &str,
        ctx: &AuditContext,
    ) -> RepoResult<ArticleComment> {
        let started_at = Instant::now();
        let result = self.repo.add_comment(article_id, content, ctx);
        log_write("comment_create", started_at, &result, |comment| {
            format!("article_id={article_id} comment_id={}", comment.id())
        });
        result
    }
}

fn log_write<T>(
    event: &'static str,
    started_at: Instant,
    result: &RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(value) => info!(
            "event={event} module=service status=ok duration_ms={duration_ms} {}",
            describe(value)
        ),
        Err(err @ (RepoError::Validation(_) | RepoError::NotFound(_))) => warn!(
            "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
}

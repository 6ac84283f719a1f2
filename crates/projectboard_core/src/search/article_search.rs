//! Search criteria and keyset-paged iteration over articles.
//!
//! # Invariants
//! - Results are ascending by article id; pages never overlap or skip rows
//!   that existed when the page boundary was read.
//! - Blank text filters are treated as absent.
//! - After yielding an error the iterator is exhausted.

use crate::model::article::{Article, ArticleId};
use crate::repo::article_repo::{ArticleRepository, RepoResult};
use std::collections::VecDeque;

const SEARCH_DEFAULT_PAGE_SIZE: u32 = 50;
const SEARCH_PAGE_SIZE_MAX: u32 = 200;

/// Filters for `ArticleRepository::search_page`.
///
/// All supplied filters must match. `title` and `hashtag` are case-sensitive
/// substring matches, `created_by` is exact, and the creation range is
/// `[created_from, created_until)` in epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSearch {
    pub title: Option<String>,
    pub hashtag: Option<String>,
    pub created_by: Option<String>,
    pub created_from: Option<i64>,
    pub created_until: Option<i64>,
    /// Rows fetched per round trip. Defaults to 50 and clamps to 200.
    pub page_size: Option<u32>,
}

impl ArticleSearch {
    pub fn title(mut self, needle: impl Into<String>) -> Self {
        self.title = Some(needle.into());
        self
    }

    pub fn hashtag(mut self, needle: impl Into<String>) -> Self {
        self.hashtag = Some(needle.into());
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }

    pub fn created_between(mut self, from: Option<i64>, until: Option<i64>) -> Self {
        self.created_from = from;
        self.created_until = until;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Drops blank text filters.
    pub fn normalized(&self) -> Self {
        Self {
            title: non_blank(self.title.as_deref()),
            hashtag: non_blank(self.hashtag.as_deref()),
            created_by: non_blank(self.created_by.as_deref()),
            ..self.clone()
        }
    }
}

/// Normalizes page size according to the search contract.
pub fn normalize_page_size(page_size: Option<u32>) -> u32 {
    match page_size {
        Some(0) | None => SEARCH_DEFAULT_PAGE_SIZE,
        Some(value) if value > SEARCH_PAGE_SIZE_MAX => SEARCH_PAGE_SIZE_MAX,
        Some(value) => value,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Lazy, restartable sequence of search matches.
///
/// Each page is fetched on demand with `id > last seen id`, so a caller can
/// stop early without paying for the rest of the result set.
pub struct ArticleSearchIter<'r, R: ArticleRepository + ?Sized> {
    repo: &'r R,
    criteria: ArticleSearch,
    page_size: u32,
    after: Option<ArticleId>,
    buffer: VecDeque<Article>,
    exhausted: bool,
}

impl<'r, R: ArticleRepository + ?Sized> ArticleSearchIter<'r, R> {
    pub fn new(repo: &'r R, criteria: &ArticleSearch) -> Self {
        let criteria = criteria.normalized();
        let page_size = normalize_page_size(criteria.page_size);
        Self {
            repo,
            criteria,
            page_size,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Restarts the sequence from the first match.
    pub fn rewind(&mut self) {
        self.after = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    /// Effective rows fetched per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn fetch_next_page(&mut self) -> RepoResult<()> {
        let page = self
            .repo
            .search_page(&self.criteria, self.after, self.page_size)?;

        let full_page = u32::try_from(page.len()).map_or(true, |len| len >= self.page_size);
        match page.last().and_then(Article::id) {
            Some(last_id) if full_page => self.after = Some(last_id),
            _ => self.exhausted = true,
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl<R: ArticleRepository + ?Sized> Iterator for ArticleSearchIter<'_, R> {
    type Item = RepoResult<Article>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_next_page() {
                self.exhausted = true;
                self.buffer.clear();
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_page_size, ArticleSearch};

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(normalize_page_size(None), 50);
        assert_eq!(normalize_page_size(Some(0)), 50);
        assert_eq!(normalize_page_size(Some(7)), 7);
        assert_eq!(normalize_page_size(Some(10_000)), 200);
    }

    #[test]
    fn normalized_drops_blank_text_filters_only() {
        let criteria = ArticleSearch::default()
            .title("  ")
            .hashtag(" #rust")
            .created_between(Some(10), None);
        let normalized = criteria.normalized();
        assert_eq!(normalized.title, None);
        assert_eq!(normalized.hashtag.as_deref(), Some(" #rust"));
        assert_eq!(normalized.created_from, Some(10));
    }
}

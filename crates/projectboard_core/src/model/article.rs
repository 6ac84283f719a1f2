//! Article domain model.
//!
//! # Responsibility
//! - Define the article record, its owned comments and its audit trail.
//! - Enforce field bounds before anything reaches storage.
//!
//! # Invariants
//! - `Article::of` is the only public constructor and never assigns an id.
//! - Two articles are equal iff both carry an id and the ids match; an
//!   unpersisted article is equal only to itself.
//! - Audit fields are stamped by the store from an `AuditContext`, never
//!   by callers.
//! - Comments are kept ascending by comment id without duplicates.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned surrogate key for articles.
pub type ArticleId = i64;

/// Store-assigned surrogate key for article comments.
pub type CommentId = i64;

/// Maximum article body length in characters.
pub const CONTENT_MAX_CHARS: usize = 10_000;
/// Maximum actor identifier length in characters.
pub const ACTOR_MAX_CHARS: usize = 100;
/// Maximum comment body length in characters.
pub const COMMENT_MAX_CHARS: usize = 500;

/// Field-level validation failures for articles, comments and actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    /// Title is empty or whitespace-only (blank after trimming).
    BlankTitle,
    /// Content is empty or whitespace-only (blank after trimming).
    BlankContent,
    ContentTooLong { chars: usize, max: usize },
    BlankActor,
    ActorTooLong { chars: usize, max: usize },
    BlankComment,
    CommentTooLong { chars: usize, max: usize },
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankContent => write!(f, "content must not be blank"),
            Self::ContentTooLong { chars, max } => {
                write!(f, "content has {chars} characters; at most {max} allowed")
            }
            Self::BlankActor => write!(f, "actor must not be blank"),
            Self::ActorTooLong { chars, max } => {
                write!(f, "actor has {chars} characters; at most {max} allowed")
            }
            Self::BlankComment => write!(f, "comment must not be blank"),
            Self::CommentTooLong { chars, max } => {
                write!(f, "comment has {chars} characters; at most {max} allowed")
            }
        }
    }
}

impl Error for ArticleValidationError {}

/// Who performs a write and when.
///
/// Supplied by the caller on every mutating call; the store copies it into
/// the audit columns and never reads the clock on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    actor: String,
    at: i64,
}

impl AuditContext {
    /// Builds a context from an actor id and an epoch-millisecond timestamp.
    pub fn new(actor: impl Into<String>, at: i64) -> Self {
        Self {
            actor: actor.into(),
            at,
        }
    }

    /// Builds a context stamped with the current system time.
    pub fn now(actor: impl Into<String>) -> Self {
        let at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self::new(actor, at)
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Epoch milliseconds.
    pub fn at(&self) -> i64 {
        self.at
    }

    /// Checks the actor against the audit column bounds.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.actor.trim().is_empty() {
            return Err(ArticleValidationError::BlankActor);
        }
        let chars = self.actor.chars().count();
        if chars > ACTOR_MAX_CHARS {
            return Err(ArticleValidationError::ActorTooLong {
                chars,
                max: ACTOR_MAX_CHARS,
            });
        }
        Ok(())
    }
}

/// Creation and last-modification stamps of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditTrail {
    created_at: i64,
    created_by: String,
    modified_at: i64,
    modified_by: String,
}

impl AuditTrail {
    pub(crate) fn new(
        created_at: i64,
        created_by: String,
        modified_at: i64,
        modified_by: String,
    ) -> Self {
        Self {
            created_at,
            created_by,
            modified_at,
            modified_by,
        }
    }

    pub(crate) fn created(ctx: &AuditContext) -> Self {
        Self::new(ctx.at, ctx.actor.clone(), ctx.at, ctx.actor.clone())
    }

    pub(crate) fn touch(&mut self, ctx: &AuditContext) {
        self.modified_at = ctx.at;
        self.modified_by = ctx.actor.clone();
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn modified_at(&self) -> i64 {
        self.modified_at
    }

    pub fn modified_by(&self) -> &str {
        &self.modified_by
    }
}

/// Comment owned by exactly one article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleComment {
    id: CommentId,
    article_id: ArticleId,
    content: String,
    #[serde(flatten)]
    audit: AuditTrail,
}

impl ArticleComment {
    pub(crate) fn restore(
        id: CommentId,
        article_id: ArticleId,
        content: String,
        audit: AuditTrail,
    ) -> Self {
        Self {
            id,
            article_id,
            content,
            audit,
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Owning article.
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }
}

impl PartialEq for ArticleComment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArticleComment {}

impl Hash for ArticleComment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Checks one comment body against its bounds.
pub fn validate_comment(content: &str) -> Result<(), ArticleValidationError> {
    if content.trim().is_empty() {
        return Err(ArticleValidationError::BlankComment);
    }
    let chars = content.chars().count();
    if chars > COMMENT_MAX_CHARS {
        return Err(ArticleValidationError::CommentTooLong {
            chars,
            max: COMMENT_MAX_CHARS,
        });
    }
    Ok(())
}

/// Project-board article.
///
/// Fields are read through accessors. Only `title`, `content` and `hashtag`
/// have setters; identity and audit data come from the store.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    id: Option<ArticleId>,
    title: String,
    content: String,
    hashtag: Option<String>,
    #[serde(flatten)]
    audit: Option<AuditTrail>,
    comments: Vec<ArticleComment>,
}

impl Article {
    /// Creates an unpersisted article from the user-supplied fields.
    ///
    /// The result has no id, no audit trail and no comments. It becomes a
    /// stored record only through `ArticleRepository::create_article`.
    pub fn of(
        title: impl Into<String>,
        content: impl Into<String>,
        hashtag: Option<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            hashtag,
            audit: None,
            comments: Vec::new(),
        }
    }

    pub(crate) fn restore(
        id: ArticleId,
        title: String,
        content: String,
        hashtag: Option<String>,
        audit: AuditTrail,
        comments: Vec<ArticleComment>,
    ) -> Self {
        let mut article = Self {
            id: Some(id),
            title,
            content,
            hashtag,
            audit: Some(audit),
            comments: Vec::new(),
        };
        article.replace_comments(comments);
        article
    }

    /// `None` until the store has persisted this article.
    pub fn id(&self) -> Option<ArticleId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn hashtag(&self) -> Option<&str> {
        self.hashtag.as_deref()
    }

    /// `None` until the store has persisted this article.
    pub fn audit(&self) -> Option<&AuditTrail> {
        self.audit.as_ref()
    }

    /// Owned comments, ascending by comment id.
    pub fn comments(&self) -> &[ArticleComment] {
        &self.comments
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_hashtag(&mut self, hashtag: Option<String>) {
        self.hashtag = hashtag;
    }

    /// Returns whether the store has assigned an identity.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks title and content bounds.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if self.title.trim().is_empty() {
            return Err(ArticleValidationError::BlankTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ArticleValidationError::BlankContent);
        }
        let chars = self.content.chars().count();
        if chars > CONTENT_MAX_CHARS {
            return Err(ArticleValidationError::ContentTooLong {
                chars,
                max: CONTENT_MAX_CHARS,
            });
        }
        Ok(())
    }

    /// Restamps modification fields; unpersisted drafts have none to stamp.
    pub(crate) fn touch(&mut self, ctx: &AuditContext) {
        if let Some(audit) = self.audit.as_mut() {
            audit.touch(ctx);
        }
    }

    fn replace_comments(&mut self, mut comments: Vec<ArticleComment>) {
        comments.sort_by_key(ArticleComment::id);
        comments.dedup_by_key(|comment| comment.id);
        self.comments = comments;
    }
}

impl PartialEq for Article {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        matches!((self.id, other.id), (Some(left), Some(right)) if left == right)
    }
}

impl Eq for Article {}

impl Hash for Article {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Partial update for the caller-editable article fields.
///
/// `None` leaves a field untouched. For `hashtag`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtag: Option<Option<String>>,
}

impl ArticlePatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn hashtag(mut self, hashtag: Option<String>) -> Self {
        self.hashtag = Some(hashtag);
        self
    }

    /// Returns whether no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.hashtag.is_none()
    }

    /// Copies the supplied fields onto `article`.
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.set_title(title.clone());
        }
        if let Some(content) = &self.content {
            article.set_content(content.clone());
        }
        if let Some(hashtag) = &self.hashtag {
            article.set_hashtag(hashtag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Article, ArticleComment, ArticleValidationError, AuditContext, AuditTrail};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn persisted(id: i64) -> Article {
        let audit = AuditTrail::created(&AuditContext::new("alice", 1));
        Article::restore(
            id,
            "t".to_string(),
            "c".to_string(),
            None,
            audit,
            Vec::new(),
        )
    }

    #[test]
    fn equality_follows_persisted_id() {
        let mut left = persisted(7);
        let right = persisted(7);
        left.set_title("changed");
        assert_eq!(left, right);
        assert_ne!(persisted(7), persisted(8));
    }

    #[test]
    fn unpersisted_article_equals_only_itself() {
        let draft = Article::of("t", "c", None);
        let twin = draft.clone();
        let alias = &draft;
        assert_eq!(&draft, alias);
        assert_ne!(draft, twin);
        assert_ne!(draft, persisted(1));
    }

    #[test]
    fn restore_orders_and_dedups_comments() {
        let audit = AuditTrail::created(&AuditContext::new("bob", 5));
        let comment = |id| ArticleComment::restore(id, 1, format!("c{id}"), audit.clone());
        let article = Article::restore(
            1,
            "t".to_string(),
            "c".to_string(),
            None,
            audit.clone(),
            vec![comment(9), comment(3), comment(9), comment(4)],
        );
        let ids = article
            .comments()
            .iter()
            .map(ArticleComment::id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 4, 9]);
    }

    #[test]
    fn touch_keeps_creation_stamp() {
        let mut article = persisted(1);
        article.touch(&AuditContext::new("bob", 99));
        let audit = article.audit().unwrap();
        assert_eq!(audit.created_by(), "alice");
        assert_eq!(audit.created_at(), 1);
        assert_eq!(audit.modified_by(), "bob");
        assert_eq!(audit.modified_at(), 99);
    }

    #[test]
    fn touch_leaves_draft_unaudited() {
        let mut draft = Article::of("t", "c", None);
        draft.touch(&AuditContext::new("bob", 99));
        assert!(draft.audit().is_none());
    }

    #[test]
    fn whitespace_only_fields_are_blank() {
        assert_eq!(
            Article::of(" \t", "c", None).validate(),
            Err(ArticleValidationError::BlankTitle)
        );
        assert_eq!(
            Article::of("t", "\n ", None).validate(),
            Err(ArticleValidationError::BlankContent)
        );
    }

    #[test]
    fn audit_context_now_reads_the_system_clock() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        let ctx = AuditContext::now("alice");
        assert_eq!(ctx.actor(), "alice");
        assert!(ctx.at() >= before);
        assert!(ctx.validate().is_ok());
    }
}

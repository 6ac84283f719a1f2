//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/update/delete/search over `articles`.
//! - Own the comment collection of each article, including cascade delete.
//! - Stamp audit columns from the caller's `AuditContext`.
//!
//! # Invariants
//! - Write paths validate fields and actor before touching SQL.
//! - Every write that spans more than one statement runs in one immediate
//!   transaction.
//! - Read paths reject malformed persisted rows instead of masking them.
//! - Comments are always returned ascending by comment id.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::article::{
    validate_comment, Article, ArticleComment, ArticleId, ArticlePatch, ArticleValidationError,
    AuditContext, AuditTrail,
};
use crate::search::article_search::ArticleSearch;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shortest needle the trigram tokenizer can match.
const TRIGRAM_MIN_CHARS: usize = 3;

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    hashtag,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM articles";

const ARTICLE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "content",
    "hashtag",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

const COMMENT_COLUMNS: &[&str] = &[
    "id",
    "article_id",
    "content",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];
const TEXT_INDEX_COLUMNS: &[&str] = &["title", "hashtag"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input violates a field bound.
    Validation(ArticleValidationError),
    /// No article with this id exists.
    NotFound(ArticleId),
    /// `create_article` was handed an instance that already has an identity.
    AlreadyPersisted(ArticleId),
    Db(DbError),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether the caller must correct its input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns whether the targeted article is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AlreadyPersisted(_) => "already_persisted",
            Self::Db(_) => "db",
            Self::InvalidData(_) => "invalid_data",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::AlreadyPersisted(id) => write!(f, "article {id} is already persisted"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "article repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "article repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "article repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage-agnostic article store.
pub trait ArticleRepository {
    /// Persists an unpersisted article and returns the stored record.
    fn create_article(&self, article: &Article, ctx: &AuditContext) -> RepoResult<Article>;
    /// Loads one article with its comments.
    fn get_article(&self, id: ArticleId) -> RepoResult<Article>;
    /// Applies the supplied fields and re-stamps modification audit data.
    fn update_article(
        &self,
        id: ArticleId,
        patch: &ArticlePatch,
        ctx: &AuditContext,
    ) -> RepoResult<Article>;
    /// Removes one article together with every comment it owns.
    fn delete_article(&self, id: ArticleId) -> RepoResult<()>;
    /// Returns up to `limit` matches with id greater than `after`, ascending
    /// by id.
    fn search_page(
        &self,
        criteria: &ArticleSearch,
        after: Option<ArticleId>,
        limit: u32,
    ) -> RepoResult<Vec<Article>>;
    /// Appends one comment to an existing article.
    fn add_comment(
        &self,
        article_id: ArticleId,
        content: &str,
        ctx: &AuditContext,
    ) -> RepoResult<ArticleComment>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Wraps a connection after checking it carries the article schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_article_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&self, article: &Article, ctx: &AuditContext) -> RepoResult<Article> {
        if let Some(id) = article.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }
        article.validate()?;
        ctx.validate()?;

        let audit = AuditTrail::created(ctx);
        self.conn.execute(
            "INSERT INTO articles (
                title,
                content,
                hashtag,
                created_at,
                created_by,
                modified_at,
                modified_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                article.title(),
                article.content(),
                article.hashtag(),
                audit.created_at(),
                audit.created_by(),
                audit.modified_at(),
                audit.modified_by(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        Ok(Article::restore(
            id,
            article.title().to_string(),
            article.content().to_string(),
            article.hashtag().map(str::to_string),
            audit,
            Vec::new(),
        ))
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Article> {
        load_article(self.conn, id)?.ok_or(RepoError::NotFound(id))
    }

    fn update_article(
        &self,
        id: ArticleId,
        patch: &ArticlePatch,
        ctx: &AuditContext,
    ) -> RepoResult<Article> {
        ctx.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut article = load_article(&tx, id)?.ok_or(RepoError::NotFound(id))?;
        patch.apply_to(&mut article);
        article.validate()?;
        article.touch(ctx);

        tx.execute(
            "UPDATE articles
             SET
                title = ?2,
                content = ?3,
                hashtag = ?4,
                modified_at = ?5,
                modified_by = ?6
             WHERE id = ?1;",
            params![
                id,
                article.title(),
                article.content(),
                article.hashtag(),
                ctx.at(),
                ctx.actor(),
            ],
        )?;
        tx.commit()?;

        Ok(article)
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM article_comments WHERE article_id = ?1;", [id])?;
        let changed = tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn search_page(
        &self,
        criteria: &ArticleSearch,
        after: Option<ArticleId>,
        limit: u32,
    ) -> RepoResult<Vec<Article>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = format!("{ARTICLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = criteria.title.as_ref() {
            push_substring_filter(&mut sql, &mut bind_values, "title", title);
        }
        if let Some(hashtag) = criteria.hashtag.as_ref() {
            push_substring_filter(&mut sql, &mut bind_values, "hashtag", hashtag);
        }
        if let Some(created_by) = criteria.created_by.as_ref() {
            sql.push_str(" AND created_by = ?");
            bind_values.push(Value::Text(created_by.clone()));
        }
        if let Some(from) = criteria.created_from {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(from));
        }
        if let Some(until) = criteria.created_until {
            sql.push_str(" AND created_at < ?");
            bind_values.push(Value::Integer(until));
        }
        if let Some(after) = after {
            sql.push_str(" AND id > ?");
            bind_values.push(Value::Integer(after));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(self.conn, row)?);
        }

        Ok(articles)
    }

    fn add_comment(
        &self,
        article_id: ArticleId,
        content: &str,
        ctx: &AuditContext,
    ) -> RepoResult<ArticleComment> {
        validate_comment(content)?;
        ctx.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !article_exists(&tx, article_id)? {
            return Err(RepoError::NotFound(article_id));
        }

        let audit = AuditTrail::created(ctx);
        tx.execute(
            "INSERT INTO article_comments (
                article_id,
                content,
                created_at,
                created_by,
                modified_at,
                modified_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                article_id,
                content,
                audit.created_at(),
                audit.created_by(),
                audit.modified_at(),
                audit.modified_by(),
            ],
        )?;
        let comment_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(ArticleComment::restore(
            comment_id,
            article_id,
            content.to_string(),
            audit,
        ))
    }
}

/// Adds a case-sensitive substring filter on `column`.
///
/// Needles of at least `TRIGRAM_MIN_CHARS` characters go through the
/// `articles_text` trigram index; shorter ones cannot be tokenized and fall
/// back to `instr` over the base table.
fn push_substring_filter(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &'static str,
    needle: &str,
) {
    if needle.chars().count() >= TRIGRAM_MIN_CHARS {
        sql.push_str(" AND id IN (SELECT rowid FROM articles_text WHERE articles_text MATCH ?)");
        bind_values.push(Value::Text(trigram_match_expression(column, needle)));
    } else {
        sql.push_str(&format!(" AND instr({column}, ?) > 0"));
        bind_values.push(Value::Text(needle.to_string()));
    }
}

fn trigram_match_expression(column: &str, needle: &str) -> String {
    let escaped = needle.replace('"', "\"\"");
    format!("{column} : \"{escaped}\"")
}

fn load_article(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_article_row(conn, row)?));
    }
    Ok(None)
}

fn parse_article_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Article> {
    let id: ArticleId = row.get("id")?;
    let audit = parse_audit(row)?;
    let comments = load_comments(conn, id)?;
    let article = Article::restore(
        id,
        row.get("title")?,
        row.get("content")?,
        row.get("hashtag")?,
        audit,
        comments,
    );
    article.validate().map_err(|err| {
        RepoError::InvalidData(format!("article {id} violates field bounds: {err}"))
    })?;
    Ok(article)
}

fn load_comments(conn: &Connection, article_id: ArticleId) -> RepoResult<Vec<ArticleComment>> {
    let mut stmt = conn.prepare(
        "SELECT
            id,
            article_id,
            content,
            created_at,
            created_by,
            modified_at,
            modified_by
         FROM article_comments
         WHERE article_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([article_id])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(ArticleComment::restore(
            row.get("id")?,
            row.get("article_id")?,
            row.get("content")?,
            parse_audit(row)?,
        ));
    }
    Ok(comments)
}

fn parse_audit(row: &Row<'_>) -> RepoResult<AuditTrail> {
    let created_by: String = row.get("created_by")?;
    let modified_by: String = row.get("modified_by")?;
    for (column, value) in [("created_by", &created_by), ("modified_by", &modified_by)] {
        AuditContext::new(value.as_str(), 0)
            .validate()
            .map_err(|err| RepoError::InvalidData(format!("invalid {column} value: {err}")))?;
    }
    Ok(AuditTrail::new(
        row.get("created_at")?,
        created_by,
        row.get("modified_at")?,
        modified_by,
    ))
}

fn article_exists(conn: &Connection, id: ArticleId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_article_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        ("articles", ARTICLE_COLUMNS),
        ("article_comments", COMMENT_COLUMNS),
        ("articles_text", TEXT_INDEX_COLUMNS),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

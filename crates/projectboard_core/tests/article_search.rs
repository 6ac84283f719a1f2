use projectboard_core::db::open_db_in_memory;
use projectboard_core::{
    Article, ArticleId, ArticleRepository, ArticleSearch, ArticleSearchIter, ArticleService,
    AuditContext, RepoResult, SqliteArticleRepository,
};

fn seed(repo: &SqliteArticleRepository<'_>) -> Vec<ArticleId> {
    let rows = [
        ("Spring Boot intro", Some("#spring"), "alice", 1_000),
        ("Rust ownership", Some("#rust"), "bob", 2_000),
        ("Spring Data JPA", Some("#spring #jpa"), "alice", 3_000),
        ("Weekly notes", None, "carol", 4_000),
        ("rust async", Some("#rust"), "bob", 5_000),
    ];
    rows.iter()
        .map(|(title, hashtag, actor, at)| {
            repo.create_article(
                &Article::of(*title, "body", hashtag.map(str::to_string)),
                &AuditContext::new(*actor, *at),
            )
            .unwrap()
            .id()
            .unwrap()
        })
        .collect()
}

fn ids(results: impl Iterator<Item = RepoResult<Article>>) -> Vec<ArticleId> {
    results
        .map(|article| article.unwrap().id().unwrap())
        .collect()
}

#[test]
fn empty_criteria_returns_everything_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let found = ids(ArticleSearchIter::new(&repo, &ArticleSearch::default()));
    assert_eq!(found, seeded);
}

#[test]
fn title_filter_is_case_sensitive_substring() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("Spring"),
    ));
    assert_eq!(found, vec![seeded[0], seeded[2]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("rust"),
    ));
    assert_eq!(found, vec![seeded[4]]);
}

#[test]
fn hashtag_filter_skips_articles_without_hashtag() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().hashtag("#spring"),
    ));
    assert_eq!(found, vec![seeded[0], seeded[2]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().hashtag("jpa"),
    ));
    assert_eq!(found, vec![seeded[2]]);
}

#[test]
fn creator_and_creation_range_filters_combine() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().created_by("bob"),
    ));
    assert_eq!(found, vec![seeded[1], seeded[4]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().created_between(Some(2_000), Some(4_000)),
    ));
    assert_eq!(found, vec![seeded[1], seeded[2]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default()
            .created_by("alice")
            .created_between(Some(2_000), None),
    ));
    assert_eq!(found, vec![seeded[2]]);
}

#[test]
fn updates_do_not_move_articles_out_of_creation_range() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    repo.update_article(
        seeded[0],
        &projectboard_core::ArticlePatch::default().title("Renamed"),
        &AuditContext::new("dave", 9_000),
    )
    .unwrap();

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().created_between(None, Some(1_500)),
    ));
    assert_eq!(found, vec![seeded[0]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().created_by("dave"),
    ));
    assert!(found.is_empty());
}

#[test]
fn small_pages_yield_the_same_sequence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let iter = ArticleSearchIter::new(&repo, &ArticleSearch::default().page_size(2));
    assert_eq!(iter.page_size(), 2);
    assert_eq!(ids(iter), seeded);

    let page = repo
        .search_page(&ArticleSearch::default(), Some(seeded[1]), 2)
        .unwrap();
    let page_ids = page
        .iter()
        .map(|article| article.id().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(page_ids, vec![seeded[2], seeded[3]]);
}

#[test]
fn iteration_is_lazy_and_restartable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let mut iter = ArticleSearchIter::new(&repo, &ArticleSearch::default().page_size(2));
    let first = iter.next().unwrap().unwrap();
    assert_eq!(first.id(), Some(seeded[0]));

    // Rows created after the cursor passed their id range still show up later.
    let late = repo
        .create_article(
            &Article::of("late", "body", None),
            &AuditContext::new("erin", 6_000),
        )
        .unwrap()
        .id()
        .unwrap();
    let rest = ids(iter.by_ref());
    assert_eq!(rest.last(), Some(&late));
    assert_eq!(rest.len(), seeded.len());

    iter.rewind();
    assert_eq!(iter.next().unwrap().unwrap().id(), Some(seeded[0]));
}

#[test]
fn search_results_carry_comments() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);
    repo.add_comment(seeded[3], "hello", &AuditContext::new("bob", 7_000))
        .unwrap();

    let service = ArticleService::new(repo);
    let found = service
        .search_articles(&ArticleSearch::default().created_by("carol"))
        .collect::<RepoResult<Vec<_>>>()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].comments().len(), 1);
    assert_eq!(found[0].comments()[0].content(), "hello");
}

#[test]
fn blank_text_filters_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title(" ").created_by(""),
    ));
    assert_eq!(found, seeded);
}

#[test]
fn text_filters_follow_updates_and_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);

    repo.update_article(
        seeded[1],
        &projectboard_core::ArticlePatch::default()
            .title("Borrow checker")
            .hashtag(Some("#borrowck".to_string())),
        &AuditContext::new("bob", 8_000),
    )
    .unwrap();
    repo.delete_article(seeded[4]).unwrap();

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("checker"),
    ));
    assert_eq!(found, vec![seeded[1]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().hashtag("#rust"),
    ));
    assert!(found.is_empty());

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("ownership"),
    ));
    assert!(found.is_empty());
}

#[test]
fn short_and_quoted_needles_still_match_substrings() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let seeded = seed(&repo);
    let quoted = repo
        .create_article(
            &Article::of("The \"quoted\" one", "body", None),
            &AuditContext::new("erin", 6_000),
        )
        .unwrap()
        .id()
        .unwrap();

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("ru"),
    ));
    assert_eq!(found, vec![seeded[4]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().hashtag("#j"),
    ));
    assert_eq!(found, vec![seeded[2]]);

    let found = ids(ArticleSearchIter::new(
        &repo,
        &ArticleSearch::default().title("\"quoted\""),
    ));
    assert_eq!(found, vec![quoted]);
}

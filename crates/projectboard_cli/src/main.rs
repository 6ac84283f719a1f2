//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `projectboard_core` linkage, configuration and storage bootstrap.
//! - Keep output deterministic `key=value` lines for quick sanity checks.

use log::error;
use projectboard_core::db::migrations::current_version;
use projectboard_core::db::open_db;
use projectboard_core::{
    init_logging, ArticleSearch, ArticleService, CoreConfig, SqliteArticleRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("projectboard_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let config = CoreConfig::from_env()?;
    if config.log.dir.is_some() {
        init_logging(&config.log)?;
    }

    println!("projectboard_core ping={}", projectboard_core::ping());
    println!(
        "projectboard_core version={}",
        projectboard_core::core_version()
    );

    let conn = open_db(&config.db_path)?;
    println!("db path={}", config.db_path.display());
    println!("db schema_version={}", current_version(&conn)?);

    let service = ArticleService::new(SqliteArticleRepository::try_new(&conn)?);
    let mut articles = 0usize;
    for article in service.search_articles(&ArticleSearch::default()) {
        article?;
        articles += 1;
    }
    println!("db articles={articles}");

    Ok(())
}

//! Database connection management using Diesel ORM.
//!
//! Each store session owns a single-connection pool. One connection keeps
//! `:memory:` databases coherent for the life of the session and matches
//! the one-writer-per-invocation model.

use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT_MS: u32 = 5000;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Strip a `sqlite://` or `sqlite:` scheme, leaving the path Diesel expects.
///
/// # Errors
/// Returns [`Error::Connection`] for URLs with any other scheme.
pub fn database_path(url: &str) -> Result<&str> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        return Ok(path);
    }
    if let Some(path) = url.strip_prefix("sqlite:") {
        return Ok(path);
    }
    match url.split_once("://") {
        Some((scheme, _)) => Err(Error::Connection(format!(
            "unsupported store url scheme: {scheme}"
        ))),
        None => Ok(url),
    }
}

/// Applies connection pragmas on every checkout.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        configure_sqlite_connection(conn).map_err(|e| {
            diesel::r2d2::Error::QueryError(diesel::result::Error::QueryBuilderError(
                e.to_string().into(),
            ))
        })
    }
}

/// Create a single-connection pool for the given database URL.
///
/// # Errors
/// Returns an error if the URL is unsupported or the database cannot be
/// opened.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_path(database_url)?);
    Pool::builder()
        .max_size(1)
        .connection_timeout(CONNECT_TIMEOUT)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

/// Configure SQLite connection pragmas used for batch writes.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_sqlite_connection(conn: &mut SqliteConnection) -> Result<()> {
    diesel::sql_query(format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
        .execute(conn)
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}

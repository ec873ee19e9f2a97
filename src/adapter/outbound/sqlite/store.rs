//! SQLite document store implementation.
//!
//! Documents are stored as JSON text in the `documents` table, namespaced by
//! `(database_name, collection_name)`. Diesel calls are blocking and run on
//! the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use parking_lot::Mutex;
use tracing::debug;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::database::model::NewDocumentRow;
use crate::adapter::outbound::sqlite::database::schema::documents;
use crate::domain::{Record, StoreSettings};
use crate::error::{Error, Result};
use crate::port::{BatchSink, DocumentStore, StoreSession};

/// Rows per INSERT statement. Keeps bound parameters under SQLite's limit
/// for any configured batch size.
const ROWS_PER_STATEMENT: usize = 500;

/// SQLite-backed [`DocumentStore`].
///
/// Every session opens its own pool on [`connect`](StoreSession::connect)
/// and applies pending migrations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDocumentStore;

impl SqliteDocumentStore {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn session(&self, settings: &StoreSettings) -> Arc<dyn StoreSession> {
        Arc::new(SqliteSession::new(settings))
    }
}

enum SessionState {
    Idle,
    Open(DbPool),
    Closed,
}

/// One session against a `(database, collection)` namespace.
pub struct SqliteSession {
    state: Mutex<SessionState>,
    url: String,
    database: String,
    collection: String,
}

impl SqliteSession {
    #[must_use]
    pub fn new(settings: &StoreSettings) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            url: settings.url.clone(),
            database: settings.database.clone(),
            collection: settings.collection.clone(),
        }
    }

    fn pool(&self) -> Result<DbPool> {
        match &*self.state.lock() {
            SessionState::Open(pool) => Ok(pool.clone()),
            SessionState::Idle => Err(Error::Connection("store session is not connected".into())),
            SessionState::Closed => Err(Error::Connection("store session is closed".into())),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool()?;
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?
    }

    fn to_rows(&self, records: &[Record]) -> Result<Vec<NewDocumentRow>> {
        let inserted_at = Utc::now().to_rfc3339();
        records
            .iter()
            .map(|record| -> Result<NewDocumentRow> {
                Ok(NewDocumentRow {
                    database_name: self.database.clone(),
                    collection_name: self.collection.clone(),
                    body: serde_json::to_string(record.as_value())?,
                    inserted_at: inserted_at.clone(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl BatchSink for SqliteSession {
    async fn insert_batch(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = self.to_rows(records)?;
        self.with_conn(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                for chunk in rows.chunks(ROWS_PER_STATEMENT) {
                    diesel::insert_into(documents::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(|e| Error::Database(e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl StoreSession for SqliteSession {
    async fn connect(&self) -> Result<()> {
        if !matches!(*self.state.lock(), SessionState::Idle) {
            return Err(Error::Connection("store session already used".into()));
        }
        let url = self.url.clone();
        let pool = tokio::task::spawn_blocking(move || -> Result<DbPool> {
            let pool = create_pool(&url)?;
            run_migrations(&pool)?;
            Ok(pool)
        })
        .await
        .map_err(|e| Error::Connection(e.to_string()))??;

        let mut state = self.state.lock();
        if matches!(*state, SessionState::Closed) {
            return Err(Error::Connection("store session is closed".into()));
        }
        *state = SessionState::Open(pool);
        debug!(
            database = %self.database,
            collection = %self.collection,
            "Store session opened"
        );
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        let database = self.database.clone();
        let collection = self.collection.clone();
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(
                    documents::table
                        .filter(documents::database_name.eq(database))
                        .filter(documents::collection_name.eq(collection)),
                )
                .execute(conn)
                .map_err(|e| Error::Database(e.to_string()))
            })
            .await?;
        debug!(deleted, "Collection rows deleted");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), SessionState::Closed);
        if matches!(previous, SessionState::Open(_)) {
            debug!(
                database = %self.database,
                collection = %self.collection,
                "Store session closed"
            );
        }
        Ok(())
    }
}

//! Request-scoped graph sessions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use grnwood_core::{ErrorContext, GrnwoodError, GrnwoodResult};
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, warn};

use crate::bookmark::Bookmark;
use crate::context::RequestContext;
use crate::driver::GraphDriver;
use crate::error::map_sqlx_error;

/// Opens sessions against the driver's databases and counts the ones
/// still outstanding.
#[derive(Debug, Clone)]
pub struct SessionManager {
    driver: Arc<GraphDriver>,
    active: Arc<AtomicUsize>,
}

impl SessionManager {
    pub fn new(driver: Arc<GraphDriver>) -> Self {
        Self {
            driver,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn driver(&self) -> &Arc<GraphDriver> {
        &self.driver
    }

    /// Sessions acquired and not yet released
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Open a session for `ctx`.
    ///
    /// With bookmarks, the requested database must exist and have committed
    /// every bookmark; anything else is a `Consistency` error. Without
    /// bookmarks, a database that cannot be opened is replaced by the
    /// default one.
    pub async fn acquire(&self, ctx: &RequestContext) -> GrnwoodResult<GraphSession> {
        let default = self.driver.default_database();
        let target = ctx.database.as_deref().unwrap_or(default);

        if ctx.has_bookmarks() {
            return self.acquire_causal(target, &ctx.bookmarks).await;
        }

        if target != default {
            match self.open(target).await {
                Ok(session) => return Ok(session),
                Err(e) => warn!(
                    requested = %target,
                    fallback = %default,
                    error = %e,
                    "Requested database unavailable, using default"
                ),
            }
        }

        self.open(default).await
    }

    async fn acquire_causal(
        &self,
        database: &str,
        bookmarks: &[String],
    ) -> GrnwoodResult<GraphSession> {
        if self.driver.pool(database).is_none() {
            return Err(consistency_error(format!(
                "Bookmarks requested against unknown database '{}'",
                database
            )));
        }

        let mut session = self.open(database).await?;
        let committed: i64 = sqlx::query_scalar("SELECT commit_seq FROM graph_meta WHERE id = 1")
            .fetch_one(session.connection())
            .await
            .map_err(|e| map_sqlx_error(e, "read_commit_sequence"))?;

        for raw in bookmarks {
            raw.parse::<Bookmark>()
                .and_then(|bookmark| bookmark.check_visible(database, committed))
                .map_err(|e| consistency_error(e.to_string()))?;
        }

        debug!(
            database = %database,
            bookmarks = bookmarks.len(),
            committed,
            "Bookmarks honoured"
        );
        Ok(session)
    }

    async fn open(&self, database: &str) -> GrnwoodResult<GraphSession> {
        let pool = self.driver.pool(database).ok_or_else(|| GrnwoodError::Connectivity {
            message: format!("Unknown graph database '{}'", database),
            source: None,
            context: ErrorContext::new("graph")
                .with_operation("acquire_session")
                .with_metadata("database", database),
        })?;

        let connection = pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(e, "acquire_session"))?;

        Ok(GraphSession::new(
            connection,
            database.to_string(),
            Arc::clone(&self.active),
        ))
    }
}

fn consistency_error(message: String) -> GrnwoodError {
    GrnwoodError::Consistency {
        message,
        context: ErrorContext::new("graph")
            .with_operation("acquire_session")
            .with_suggestion("Retry once the bookmarked write has been committed"),
    }
}

/// A checked out connection bound to one logical database.
///
/// Dropping the session returns the connection to its pool; [`release`]
/// does the same and hands back the bookmark of the last committed write.
///
/// [`release`]: GraphSession::release
pub struct GraphSession {
    connection: PoolConnection<Sqlite>,
    database: String,
    last_bookmark: Option<Bookmark>,
    active: Arc<AtomicUsize>,
}

impl GraphSession {
    fn new(connection: PoolConnection<Sqlite>, database: String, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        debug!(database = %database, "Session acquired");
        Self {
            connection,
            database,
            last_bookmark: None,
            active,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.connection
    }

    pub fn last_bookmark(&self) -> Option<&Bookmark> {
        self.last_bookmark.as_ref()
    }

    pub(crate) fn record_bookmark(&mut self, bookmark: Bookmark) {
        self.last_bookmark = Some(bookmark);
    }

    pub fn release(mut self) -> Option<Bookmark> {
        self.last_bookmark.take()
    }
}

impl std::fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("database", &self.database)
            .field("last_bookmark", &self.last_bookmark)
            .finish_non_exhaustive()
    }
}

impl Drop for GraphSession {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!(database = %self.database, "Session released");
    }
}

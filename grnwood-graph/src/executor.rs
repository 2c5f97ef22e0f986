//! Query execution over request-scoped sessions

use grnwood_core::{ErrorContext, GrnwoodError, GrnwoodResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row, TypeInfo, ValueRef};
use tracing::debug;

use crate::bookmark::Bookmark;
use crate::context::RequestContext;
use crate::error::map_sqlx_error;
use crate::session::{GraphSession, SessionManager};
use crate::statement::{AccessMode, GraphQuery, Projection};

/// The single record a query yields
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Field(Value),
    Entity(Map<String, Value>),
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub record: Record,
    /// Present when the query committed a write
    pub bookmark: Option<Bookmark>,
}

impl QueryResult {
    /// Deserialize the record into a domain type
    pub fn decode<T: DeserializeOwned>(self) -> GrnwoodResult<T> {
        let value = match self.record {
            Record::Field(value) => value,
            Record::Entity(map) => Value::Object(map),
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// A value produced by a write, with the bookmark that makes it observable
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    pub bookmark: Option<Bookmark>,
}

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    sessions: SessionManager,
}

impl QueryExecutor {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run `query` on a fresh session and release it before returning.
    ///
    /// An empty result is `NotFound`; for writes the transaction is rolled
    /// back first.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        query: &GraphQuery,
    ) -> GrnwoodResult<QueryResult> {
        let mut session = self.sessions.acquire(ctx).await?;

        let outcome = match query.mode() {
            AccessMode::Read => run_read(&mut session, query).await,
            AccessMode::Write => run_write(&mut session, query).await,
        };
        let bookmark = session.release();

        let record = outcome?;
        Ok(QueryResult { record, bookmark })
    }

    /// Execute and decode in one step
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        query: &GraphQuery,
    ) -> GrnwoodResult<Committed<T>> {
        let result = self.execute(ctx, query).await?;
        let bookmark = result.bookmark.clone();
        Ok(Committed {
            value: result.decode()?,
            bookmark,
        })
    }
}

async fn run_read(session: &mut GraphSession, query: &GraphQuery) -> GrnwoodResult<Record> {
    let mut rows = Vec::new();
    for step in query.steps() {
        rows = step
            .to_query()
            .fetch_all(session.connection())
            .await
            .map_err(|e| map_sqlx_error(e, "execute_read"))?;
    }

    match rows.first() {
        Some(row) => project(row, query.projection()),
        None => Err(empty_result()),
    }
}

async fn run_write(session: &mut GraphSession, query: &GraphQuery) -> GrnwoodResult<Record> {
    let database = session.database().to_string();
    let mut tx = session
        .connection()
        .begin()
        .await
        .map_err(|e| map_sqlx_error(e, "begin_write"))?;

    let mut rows = Vec::new();
    for step in query.steps() {
        rows = step
            .to_query()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, "execute_write"))?;
    }

    let Some(row) = rows.first() else {
        tx.rollback()
            .await
            .map_err(|e| map_sqlx_error(e, "rollback_write"))?;
        debug!(database = %database, "Write produced no record, rolled back");
        return Err(empty_result());
    };
    let record = project(row, query.projection())?;

    let sequence: i64 = sqlx::query_scalar(
        "UPDATE graph_meta SET commit_seq = commit_seq + 1 WHERE id = 1 RETURNING commit_seq",
    )
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_sqlx_error(e, "bump_commit_sequence"))?;

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error(e, "commit_write"))?;

    let bookmark = Bookmark::new(database, sequence);
    debug!(bookmark = %bookmark, "Write committed");
    session.record_bookmark(bookmark);
    Ok(record)
}

fn project(row: &SqliteRow, projection: Projection) -> GrnwoodResult<Record> {
    match projection {
        Projection::FirstField => first_field(row).map(Record::Field),
        Projection::Entity => {
            let document: Option<String> = row
                .try_get(0)
                .map_err(|e| map_sqlx_error(e, "project_entity"))?;
            let Some(document) = document else {
                return Err(empty_result());
            };
            match serde_json::from_str(&document)? {
                Value::Object(map) => Ok(Record::Entity(map)),
                other => Err(GrnwoodError::Storage {
                    message: format!("Expected an entity document, got {}", other),
                    source: None,
                    context: ErrorContext::new("graph").with_operation("project_entity"),
                }),
            }
        }
    }
}

fn first_field(row: &SqliteRow) -> GrnwoodResult<Value> {
    let raw = row
        .try_get_raw(0)
        .map_err(|e| map_sqlx_error(e, "project_field"))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" => row.try_get::<i64, _>(0).map(Value::from),
        "REAL" => row.try_get::<f64, _>(0).map(Value::from),
        "TEXT" => row.try_get::<String, _>(0).map(Value::from),
        other => {
            return Err(GrnwoodError::Storage {
                message: format!("Unsupported field type {}", other),
                source: None,
                context: ErrorContext::new("graph").with_operation("project_field"),
            })
        }
    };
    value.map_err(|e| map_sqlx_error(e, "project_field"))
}

fn empty_result() -> GrnwoodError {
    GrnwoodError::NotFound {
        resource: "record".to_string(),
        context: ErrorContext::new("graph").with_operation("execute"),
    }
}

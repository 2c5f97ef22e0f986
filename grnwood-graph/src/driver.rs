//! Connection pools for the logical graph databases

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use grnwood_core::{ErrorContext, GraphConfig, GrnwoodError, GrnwoodResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::error::map_sqlx_error;
use crate::schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns one pool per configured logical database.
///
/// Cheap to share behind an `Arc`; pools are internally reference counted.
#[derive(Debug)]
pub struct GraphDriver {
    default_database: String,
    pools: BTreeMap<String, SqlitePool>,
}

impl GraphDriver {
    /// Open every configured database and prepare its schema.
    ///
    /// Table creation failures are always fatal. Constraint assertion
    /// failures are fatal when `strict_schema` is set and logged otherwise.
    pub async fn connect(config: &GraphConfig) -> GrnwoodResult<Self> {
        let mut pools = BTreeMap::new();

        let default_pool = open_pool(&config.uri, config.max_connections).await?;
        pools.insert(config.database.clone(), default_pool);

        for (name, uri) in &config.databases {
            if name == &config.database {
                warn!(database = %name, "Ignoring duplicate entry for the default database");
                continue;
            }
            let pool = open_pool(uri, config.max_connections).await?;
            pools.insert(name.clone(), pool);
        }

        for (name, pool) in &pools {
            schema::ensure_tables(pool).await?;
            if let Err(e) = schema::assert_constraints(pool).await {
                if config.strict_schema {
                    error!(database = %name, error = %e, "Constraint assertion failed");
                    return Err(e);
                }
                warn!(
                    database = %name,
                    error = %e,
                    "Constraint assertion failed, continuing without it"
                );
            }
        }

        info!(
            default = %config.database,
            databases = pools.len(),
            "Graph driver ready"
        );

        Ok(Self {
            default_database: config.database.clone(),
            pools,
        })
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    pub fn pool(&self, database: &str) -> Option<&SqlitePool> {
        self.pools.get(database)
    }

    pub fn databases(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Close every pool, waiting for checked out connections to return
    pub async fn close(&self) {
        for pool in self.pools.values() {
            pool.close().await;
        }
        info!("Graph driver closed");
    }
}

async fn open_pool(uri: &str, max_connections: u32) -> GrnwoodResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(uri)
        .map_err(|e| GrnwoodError::Config {
            message: format!("Invalid graph database URI '{}': {}", uri, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("graph")
                .with_operation("open_pool")
                .with_suggestion("Use a URI of the form sqlite://path/to/file.db"),
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error(e, "open_pool"))
}

//! Property graph storage layout and unique constraints

use grnwood_core::GrnwoodResult;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::map_sqlx_error;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS nodes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL,
        properties TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(properties))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS relationships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        rel_type TEXT NOT NULL,
        start_id INTEGER NOT NULL REFERENCES nodes(id),
        end_id INTEGER NOT NULL REFERENCES nodes(id),
        properties TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(properties))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_start ON relationships(start_id, rel_type)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_end ON relationships(end_id, rel_type)",
    r#"
    CREATE TABLE IF NOT EXISTS graph_meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        commit_seq INTEGER NOT NULL
    )
    "#,
    "INSERT OR IGNORE INTO graph_meta (id, commit_seq) VALUES (1, 0)",
];

/// A unique property constraint on one node label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueConstraint {
    pub label: &'static str,
    pub property: &'static str,
    ddl: &'static str,
}

pub const UNIQUE_CONSTRAINTS: &[UniqueConstraint] = &[
    UniqueConstraint {
        label: "User",
        property: "userId",
        ddl: "CREATE UNIQUE INDEX IF NOT EXISTS uq_user_userid ON nodes(json_extract(properties, '$.userId')) WHERE label = 'User'",
    },
    UniqueConstraint {
        label: "User",
        property: "googleId",
        ddl: "CREATE UNIQUE INDEX IF NOT EXISTS uq_user_googleid ON nodes(json_extract(properties, '$.googleId')) WHERE label = 'User'",
    },
    UniqueConstraint {
        label: "Business",
        property: "businessId",
        ddl: "CREATE UNIQUE INDEX IF NOT EXISTS uq_business_businessid ON nodes(json_extract(properties, '$.businessId')) WHERE label = 'Business'",
    },
    UniqueConstraint {
        label: "Review",
        property: "reviewId",
        ddl: "CREATE UNIQUE INDEX IF NOT EXISTS uq_review_reviewid ON nodes(json_extract(properties, '$.reviewId')) WHERE label = 'Review'",
    },
    UniqueConstraint {
        label: "Category",
        property: "name",
        ddl: "CREATE UNIQUE INDEX IF NOT EXISTS uq_category_name ON nodes(json_extract(properties, '$.name')) WHERE label = 'Category'",
    },
];

/// Create the node, relationship and commit sequence tables
pub async fn ensure_tables(pool: &SqlitePool) -> GrnwoodResult<()> {
    for ddl in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(e, "ensure_tables"))?;
    }
    debug!("Graph tables present");
    Ok(())
}

/// Assert every unique constraint, stopping at the first failure
pub async fn assert_constraints(pool: &SqlitePool) -> GrnwoodResult<()> {
    for constraint in UNIQUE_CONSTRAINTS {
        sqlx::query(constraint.ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(e, "assert_constraints"))?;
        debug!(
            label = constraint.label,
            property = constraint.property,
            "Unique constraint asserted"
        );
    }
    info!(count = UNIQUE_CONSTRAINTS.len(), "Graph constraints asserted");
    Ok(())
}

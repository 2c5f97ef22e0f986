//! Shared fixtures for graph integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use grnwood_core::{FederatedIdentity, GraphConfig, IdentityField};
use grnwood_graph::{GraphDriver, NewUser, QueryExecutor, SessionManager};
use tempfile::TempDir;

pub struct TestGraph {
    // Keeps the database files alive for the duration of the test
    pub dir: TempDir,
    pub executor: QueryExecutor,
}

impl TestGraph {
    pub fn sessions(&self) -> &SessionManager {
        self.executor.sessions()
    }
}

pub fn config(dir: &Path) -> GraphConfig {
    let mut config = GraphConfig {
        uri: format!("sqlite://{}", dir.join("grnwood.db").display()),
        max_connections: 4,
        ..GraphConfig::default()
    };
    config.databases.insert(
        "archive".to_string(),
        format!("sqlite://{}", dir.join("archive.db").display()),
    );
    config
}

pub async fn graph() -> TestGraph {
    let dir = tempfile::tempdir().unwrap();
    let driver = GraphDriver::connect(&config(dir.path())).await.unwrap();
    let executor = QueryExecutor::new(SessionManager::new(Arc::new(driver)));
    TestGraph { dir, executor }
}

pub fn new_user(google_id: &str, email: Option<&str>) -> NewUser {
    NewUser {
        identity: FederatedIdentity::new(IdentityField::GoogleId, google_id).unwrap(),
        display_name: Some("Ada".to_string()),
        email: email.map(str::to_string),
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database and script fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::db::{Connector, SqliteConnector};
use crate::ScriptLocator;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Schema of a database that predates the version ledger (2.1.7).
pub const LEGACY_217_SCHEMA: &str = "
    CREATE TABLE configuration (name TEXT PRIMARY KEY, value TEXT);
    INSERT INTO configuration VALUES ('init', 'true');
";

/// A throwaway on-disk database with a sibling script directory.
pub struct TestDb {
    dir: TempDir,
    path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir(dir.path().join("scripts")).expect("create scripts dir");
        let path = dir.path().join("cloud.db");
        Self { dir, path }
    }

    /// A database initialised with `schema`.
    pub fn with_schema(schema: &str) -> Self {
        let db = Self::new();
        db.connect().execute_batch(schema).expect("apply fixture schema");
        db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn connector(&self) -> SqliteConnector {
        SqliteConnector::new(&self.path)
    }

    pub fn connect(&self) -> Connection {
        self.connector().connect().expect("open fixture database")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.dir.path().join("scripts")
    }

    pub fn write_script(&self, name: &str, sql: &str) -> PathBuf {
        let path = self.scripts_dir().join(name);
        std::fs::write(&path, sql).expect("write fixture script");
        path
    }

    pub fn locator(&self) -> ScriptLocator {
        ScriptLocator::with_search_path([self.scripts_dir()])
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.connect()
            .query_row(sql, [], |row| row.get(0))
            .expect("count query")
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database connections and error classification.
//!
//! Connections are opened per unit of work through a [`Connector`] and
//! released when dropped, on every exit path.

use regex::Regex;
use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Default time a connection waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens fresh connections to the target database.
pub trait Connector: Send + Sync {
    fn connect(&self) -> rusqlite::Result<Connection>;
}

/// Connector for an on-disk SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for SqliteConnector {
    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}

/// Kind of schema object named in a "no such ..." rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Column,
    Index,
    Trigger,
    View,
}

/// The database's own report that an object does not exist.
///
/// This is the only failure shape the idempotent helpers treat as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absence {
    pub kind: ObjectKind,
    pub name: String,
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static NO_SUCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^no such (table|column|index|trigger|view): (?:\w+\.)?"?([^"]+)"?$"#)
        .expect("constant regex pattern is valid")
});

/// Classify `err` as an expected absence, or `None` for anything else
/// (permission, locking, I/O, syntax...).
pub fn absence(err: &rusqlite::Error) -> Option<Absence> {
    let (code, message) = match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => (e.code, msg),
        rusqlite::Error::SqlInputError { error, msg, .. } => (error.code, msg),
        _ => return None,
    };
    if code != ErrorCode::Unknown {
        return None;
    }
    let caps = NO_SUCH_PATTERN.captures(message.trim())?;
    let kind = match &caps[1] {
        "table" => ObjectKind::Table,
        "column" => ObjectKind::Column,
        "index" => ObjectKind::Index,
        "trigger" => ObjectKind::Trigger,
        _ => ObjectKind::View,
    };
    Some(Absence {
        kind,
        name: caps[2].to_string(),
    })
}

/// Quote an identifier for interpolation into DDL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;

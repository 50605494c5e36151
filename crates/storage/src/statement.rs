// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent DDL helpers.
//!
//! Steps may be re-run after a crash, so every structural change must
//! tolerate having already been applied. Each helper issues its mutation
//! and treats the database's own "no such ..." rejection as success,
//! reporting whether anything was actually removed. Every other failure
//! propagates as [`StatementError::Unexpected`].

use crate::db::{absence, quote_ident};
use crate::rebuild::{rebuild_table, table_sql, DefinitionError, TableDef};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("{context}: {source}")]
    Unexpected {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot read the definition of table {table}: {source}")]
    Unparseable {
        table: String,
        #[source]
        source: DefinitionError,
    },
}

/// What `drop_key_if_exists` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A named index on the table (including unique keys created as indexes)
    Index,
    /// A named `CONSTRAINT <key> FOREIGN KEY` table constraint
    ForeignKey,
}

fn unexpected(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> StatementError {
    let context = context.into();
    move |source| StatementError::Unexpected { context, source }
}

/// Run a mutating statement, mapping an expected absence to `Ok(false)`.
fn execute_tolerant(conn: &Connection, sql: &str, context: &str) -> Result<bool, StatementError> {
    match conn.execute_batch(sql) {
        Ok(()) => Ok(true),
        Err(e) => match absence(&e) {
            Some(missing) => {
                debug!(kind = ?missing.kind, name = %missing.name, "{context}: already absent");
                Ok(false)
            }
            None => Err(unexpected(context)(e)),
        },
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, StatementError> {
    Ok(table_sql(conn, table)
        .map_err(unexpected(format!("probe table {table}")))?
        .is_some())
}

/// Whether `table` has a column named `column`. A missing table has no columns.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, StatementError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE",
            [table, column],
            |row| row.get(0),
        )
        .map_err(unexpected(format!("probe column {table}.{column}")))?;
    Ok(count > 0)
}

pub fn index_exists(conn: &Connection, index: &str) -> Result<bool, StatementError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [index],
            |row| row.get(0),
        )
        .map_err(unexpected(format!("probe index {index}")))?;
    Ok(count > 0)
}

/// `ALTER TABLE <table> DROP COLUMN <column>`, tolerating a missing column
/// or table. Returns whether the column was dropped.
pub fn drop_column_if_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, StatementError> {
    let sql = format!(
        "ALTER TABLE {} DROP COLUMN {}",
        quote_ident(table),
        quote_ident(column)
    );
    execute_tolerant(conn, &sql, &format!("drop column {table}.{column}"))
}

/// Drop an index or foreign key named `key` on `table`, tolerating its
/// absence. Returns whether anything was dropped.
pub fn drop_key_if_exists(
    conn: &Connection,
    table: &str,
    key: &str,
    kind: KeyKind,
) -> Result<bool, StatementError> {
    match kind {
        KeyKind::Index => {
            let context = format!("drop index {key} on {table}");
            let owner: Option<String> = conn
                .query_row(
                    "SELECT tbl_name FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(unexpected(context.as_str()))?;
            match owner {
                None => {
                    debug!(index = key, "{context}: already absent");
                    Ok(false)
                }
                Some(owner) if !owner.eq_ignore_ascii_case(table) => {
                    warn!(index = key, %owner, "{context}: index belongs to another table");
                    Ok(false)
                }
                Some(_) => {
                    let sql = format!("DROP INDEX {}", quote_ident(key));
                    execute_tolerant(conn, &sql, &context)
                }
            }
        }
        KeyKind::ForeignKey => {
            let context = format!("drop foreign key {key} on {table}");
            rebuild_without(conn, table, &context, |def| def.remove_foreign_key(key))
        }
    }
}

/// Drop the primary key of `table`, tolerating a table without one.
/// Returns whether a primary key was removed.
pub fn drop_primary_key_if_exists(conn: &Connection, table: &str) -> Result<bool, StatementError> {
    let context = format!("drop primary key on {table}");
    rebuild_without(conn, table, &context, TableDef::remove_primary_key)
}

/// Rebuild `table` with `edit` applied to its definition, if `edit`
/// reports a change. Missing tables count as absent.
fn rebuild_without(
    conn: &Connection,
    table: &str,
    context: &str,
    edit: impl FnOnce(&mut TableDef) -> bool,
) -> Result<bool, StatementError> {
    let Some(sql) = table_sql(conn, table).map_err(unexpected(context))? else {
        debug!(table, "{context}: table absent");
        return Ok(false);
    };
    let mut def = TableDef::parse(&sql).map_err(|source| StatementError::Unparseable {
        table: table.to_string(),
        source,
    })?;
    if !edit(&mut def) {
        debug!(table, "{context}: already absent");
        return Ok(false);
    }
    rebuild_table(conn, table, &def).map_err(unexpected(context))?;
    Ok(true)
}

#[cfg(test)]
#[path = "statement_tests.rs"]
mod tests;

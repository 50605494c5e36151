// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table rebuild for constraints SQLite cannot drop in place.
//!
//! SQLite has no `ALTER TABLE ... DROP CONSTRAINT`. Removing a foreign key
//! or primary key means recreating the table without it:
//!
//! ```text
//! PRAGMA foreign_keys = OFF          (defer_foreign_keys inside a transaction)
//! PRAGMA legacy_alter_table = ON
//! SAVEPOINT dbup_rebuild
//!   CREATE TABLE t__rebuild (...without the constraint...)
//!   INSERT INTO t__rebuild SELECT * FROM t
//!   DROP TABLE t
//!   ALTER TABLE t__rebuild RENAME TO t
//!   (recreate indexes and triggers of t)
//! RELEASE dbup_rebuild
//! (pragmas restored)
//! ```
//!
//! Legacy rename semantics keep SQLite from re-resolving views and triggers
//! that name `t` while it is briefly missing.

use crate::db::quote_ident;
use rusqlite::{Connection, OptionalExtension};
use sqlparser::ast::{ColumnOption, CreateTable, Ident, ObjectName, Statement, TableConstraint};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::{Parser, ParserError};
use thiserror::Error;

const SAVEPOINT: &str = "dbup_rebuild";

/// Why a stored table definition could not be edited.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error(transparent)]
    Syntax(#[from] ParserError),
    #[error("stored schema is not a single CREATE TABLE statement")]
    NotCreateTable,
}

/// A parsed `CREATE TABLE` statement.
#[derive(Debug, Clone)]
pub(crate) struct TableDef {
    create: CreateTable,
}

impl TableDef {
    pub fn parse(sql: &str) -> Result<Self, DefinitionError> {
        let mut statements = Parser::parse_sql(&SQLiteDialect {}, sql)?;
        match (statements.pop(), statements.is_empty()) {
            (Some(Statement::CreateTable(create)), true) => Ok(Self { create }),
            _ => Err(DefinitionError::NotCreateTable),
        }
    }

    /// Remove the table constraint `CONSTRAINT <name> FOREIGN KEY ...`.
    /// Returns false when no such constraint exists.
    pub fn remove_foreign_key(&mut self, name: &str) -> bool {
        let before = self.create.constraints.len();
        self.create.constraints.retain(|constraint| {
            !matches!(
                constraint,
                TableConstraint::ForeignKey { name: Some(ident), .. }
                    if ident.value.eq_ignore_ascii_case(name)
            )
        });
        self.create.constraints.len() != before
    }

    /// Remove the primary key, whether declared as a table constraint or
    /// inline on a column. Returns false when the table has none.
    pub fn remove_primary_key(&mut self) -> bool {
        let before = self.create.constraints.len();
        self.create
            .constraints
            .retain(|constraint| !matches!(constraint, TableConstraint::PrimaryKey { .. }));
        if self.create.constraints.len() != before {
            return true;
        }

        for column in &mut self.create.columns {
            let Some(at) = column.options.iter().position(|def| {
                matches!(def.option, ColumnOption::Unique { is_primary: true, .. })
            }) else {
                continue;
            };
            column.options.remove(at);
            while column
                .options
                .get(at)
                .is_some_and(|def| qualifies_primary_key(&def.option))
            {
                column.options.remove(at);
            }
            return true;
        }
        false
    }

    /// The statement again, creating `table` instead.
    pub fn to_create_sql(&self, table: &str) -> String {
        let mut create = self.create.clone();
        create.name = ObjectName::from(vec![Ident::with_quote('"', table)]);
        Statement::CreateTable(create).to_string()
    }
}

/// `ON CONFLICT` and `AUTOINCREMENT` only ever follow a primary key.
fn qualifies_primary_key(option: &ColumnOption) -> bool {
    let text = option.to_string().to_ascii_uppercase();
    text == "AUTOINCREMENT" || text.starts_with("ON CONFLICT")
}

/// Stored `CREATE TABLE` text, or `None` when the table does not exist.
pub(crate) fn table_sql(conn: &Connection, table: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )
    .optional()
}

/// Recreate `table` from `def`, preserving rows, indexes and triggers.
///
/// Runs inside a savepoint, also when the caller holds a transaction. A
/// failure restores the old definition.
pub(crate) fn rebuild_table(
    conn: &Connection,
    table: &str,
    def: &TableDef,
) -> rusqlite::Result<()> {
    let scratch = format!("{table}__rebuild");
    let dependents: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT sql FROM sqlite_master \
             WHERE tbl_name = ?1 AND type IN ('index', 'trigger') AND sql IS NOT NULL",
        )?;
        let rows = stmt.query_map([table], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };

    // foreign_keys cannot change inside a transaction
    let _fk = if conn.is_autocommit() {
        PragmaGuard::set(conn, "foreign_keys", false)?
    } else {
        PragmaGuard::set(conn, "defer_foreign_keys", true)?
    };
    let _alter = PragmaGuard::set(conn, "legacy_alter_table", true)?;

    let savepoint = Savepoint::begin(conn)?;
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(&scratch)))?;
    conn.execute_batch(&def.to_create_sql(&scratch))?;
    conn.execute_batch(&format!(
        "INSERT INTO {} SELECT * FROM {}",
        quote_ident(&scratch),
        quote_ident(table)
    ))?;
    conn.execute_batch(&format!("DROP TABLE {}", quote_ident(table)))?;
    conn.execute_batch(&format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_ident(&scratch),
        quote_ident(table)
    ))?;
    for sql in &dependents {
        conn.execute_batch(sql)?;
    }
    savepoint.release()
}

/// Rolls back to the savepoint on drop unless released.
struct Savepoint<'c> {
    conn: &'c Connection,
    released: bool,
}

impl<'c> Savepoint<'c> {
    fn begin(conn: &'c Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT}"))?;
        Ok(Self {
            conn,
            released: false,
        })
    }

    fn release(mut self) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!("RELEASE {SAVEPOINT}"))?;
        self.released = true;
        Ok(())
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let sql = format!("ROLLBACK TO {SAVEPOINT}; RELEASE {SAVEPOINT}");
        if let Err(e) = self.conn.execute_batch(&sql) {
            tracing::warn!(error = %e, "failed to roll back table rebuild");
        }
    }
}

/// Sets a boolean pragma for its lifetime, restoring the previous value
/// on drop.
struct PragmaGuard<'c> {
    conn: &'c Connection,
    name: &'static str,
    previous: bool,
}

impl<'c> PragmaGuard<'c> {
    fn set(conn: &'c Connection, name: &'static str, value: bool) -> rusqlite::Result<Self> {
        let previous: bool = conn.pragma_query_value(None, name, |row| row.get(0))?;
        conn.pragma_update(None, name, value)?;
        Ok(Self {
            conn,
            name,
            previous,
        })
    }
}

impl Drop for PragmaGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.pragma_update(None, self.name, self.previous) {
            tracing::warn!(
                pragma = self.name,
                error = %e,
                "failed to restore pragma after rebuild"
            );
        }
    }
}

#[cfg(test)]
#[path = "rebuild_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version Resolver: determines the database's current version.
//!
//! With a ledger, the latest `Complete` row decides. Databases older than
//! the ledger are classified by schema probes, kept as ordered
//! `{probe, version}` tables so they can be inspected and tested alone.

use crate::ledger::{Ledger, LedgerError};
use crate::statement::{column_exists, table_exists, StatementError};
use dbup_core::Version;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot determine the database version: {0}")]
    UnknownVersion(String),
    #[error(
        "upgrade to {version} was interrupted and no completed version is recorded; \
         manual intervention required"
    )]
    Interrupted { version: Version },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("legacy schema probe failed: {0}")]
    Probe(#[from] StatementError),
}

/// A schema check used to recognise databases that predate the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    TableExists(String),
    TableMissing(String),
    ColumnExists { table: String, column: String },
    ColumnMissing { table: String, column: String },
    All(Vec<Probe>),
}

impl Probe {
    pub fn table_exists(table: &str) -> Self {
        Probe::TableExists(table.to_string())
    }

    pub fn table_missing(table: &str) -> Self {
        Probe::TableMissing(table.to_string())
    }

    pub fn column_exists(table: &str, column: &str) -> Self {
        Probe::ColumnExists {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn column_missing(table: &str, column: &str) -> Self {
        Probe::ColumnMissing {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn matches(&self, conn: &Connection) -> Result<bool, StatementError> {
        match self {
            Probe::TableExists(table) => table_exists(conn, table),
            Probe::TableMissing(table) => Ok(!table_exists(conn, table)?),
            Probe::ColumnExists { table, column } => column_exists(conn, table, column),
            Probe::ColumnMissing { table, column } => {
                Ok(table_exists(conn, table)? && !column_exists(conn, table, column)?)
            }
            Probe::All(probes) => {
                for probe in probes {
                    if !probe.matches(conn)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// One row of a bootstrap table: if `probe` matches, the database is at `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProbe {
    pub probe: Probe,
    pub version: Version,
}

impl LegacyProbe {
    pub fn new(probe: Probe, version: Version) -> Self {
        Self { probe, version }
    }
}

/// Bootstrap tables for pre-ledger databases. Rows are tried in order and
/// the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProbes {
    /// Used when the ledger table does not exist
    pub without_ledger: Vec<LegacyProbe>,
    /// Used when the ledger table exists but holds no rows
    pub empty_ledger: Vec<LegacyProbe>,
}

impl LegacyProbes {
    pub fn none() -> Self {
        Self {
            without_ledger: Vec::new(),
            empty_ledger: Vec::new(),
        }
    }
}

impl Default for LegacyProbes {
    fn default() -> Self {
        let v = known_version;
        Self {
            without_ledger: vec![
                LegacyProbe::new(
                    Probe::All(vec![
                        Probe::table_exists("configuration"),
                        Probe::table_missing("nics"),
                    ]),
                    v("2.1.7"),
                ),
                LegacyProbe::new(
                    Probe::All(vec![
                        Probe::table_exists("nics"),
                        Probe::column_missing("firewall_rules", "is_static_nat"),
                    ]),
                    v("2.1.8"),
                ),
                LegacyProbe::new(
                    Probe::All(vec![
                        Probe::table_exists("nics"),
                        Probe::column_exists("firewall_rules", "is_static_nat"),
                    ]),
                    v("2.2.1"),
                ),
            ],
            empty_ledger: vec![
                LegacyProbe::new(Probe::column_exists("cluster", "removed"), v("2.2.2")),
                LegacyProbe::new(Probe::column_missing("cluster", "removed"), v("2.2.1")),
            ],
        }
    }
}

// Allow expect here as the legacy versions are constants
#[allow(clippy::expect_used)]
fn known_version(s: &str) -> Version {
    Version::parse(s).expect("constant version is valid")
}

#[derive(Debug, Clone, Default)]
pub struct VersionResolver {
    probes: LegacyProbes,
}

impl VersionResolver {
    pub fn new(probes: LegacyProbes) -> Self {
        Self { probes }
    }

    pub fn probes(&self) -> &LegacyProbes {
        &self.probes
    }

    pub fn current_version(&self, conn: &Connection) -> Result<Version, ResolveError> {
        let ledger = Ledger::new(conn);
        if !ledger.exists()? {
            return classify(conn, &self.probes.without_ledger, "no version ledger");
        }
        if let Some(entry) = ledger.latest_complete()? {
            debug!(version = %entry.version, id = entry.id, "resolved from ledger");
            return Ok(entry.version);
        }
        if let Some(pending) = ledger.pending_upgrade()? {
            return Err(ResolveError::Interrupted {
                version: pending.version,
            });
        }
        classify(conn, &self.probes.empty_ledger, "empty version ledger")
    }
}

fn classify(
    conn: &Connection,
    table: &[LegacyProbe],
    situation: &str,
) -> Result<Version, ResolveError> {
    for row in table {
        if row.probe.matches(conn)? {
            info!(version = %row.version, "{situation}; legacy schema detected");
            return Ok(row.version.clone());
        }
    }
    Err(ResolveError::UnknownVersion(format!(
        "{situation} and no legacy schema probe matched"
    )))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

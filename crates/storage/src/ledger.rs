// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version ledger: the append-only `version` table.
//!
//! ```sql
//! id      INTEGER PRIMARY KEY AUTOINCREMENT
//! version TEXT
//! updated TEXT     -- RFC 3339, UTC
//! step    TEXT     -- 'Upgrade' | 'Complete'
//! ```
//!
//! Rows are only ever inserted. The latest `Complete` row is the current
//! version; an `Upgrade` row with no later `Complete` row at the same or a
//! higher version marks a run that stopped mid-step.

use chrono::{DateTime, SecondsFormat, Utc};
use dbup_core::{Version, VersionRange};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Name of the ledger table
pub const LEDGER_TABLE: &str = "version";

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS version (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL,
    updated TEXT NOT NULL,
    step    TEXT NOT NULL CHECK (step IN ('Upgrade', 'Complete'))
)";

const SELECT_ENTRIES: &str = "SELECT id, version, updated, step FROM version";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("version ledger query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("corrupt version ledger row {id}: {message}")]
    Corrupt { id: i64, message: String },
}

/// Phase recorded in a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Upgrading,
    Complete,
}

impl Phase {
    /// Value stored in the `step` column
    pub fn as_column(self) -> &'static str {
        match self {
            Phase::Upgrading => "Upgrade",
            Phase::Complete => "Complete",
        }
    }

    fn from_column(s: &str) -> Option<Self> {
        match s {
            "Upgrade" => Some(Phase::Upgrading),
            "Complete" => Some(Phase::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upgrading => write!(f, "upgrading"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub version: Version,
    pub phase: Phase,
    pub updated: DateTime<Utc>,
}

/// Outcome of [`Ledger::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The `Upgrade` row was written with this id
    Granted(i64),
    /// Another run has an upgrade in flight
    Pending(LedgerEntry),
    /// The current version is outside the step's upgradable range
    Advanced(LedgerEntry),
}

/// Ledger operations over a borrowed connection.
pub struct Ledger<'c> {
    conn: &'c Connection,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn exists(&self) -> Result<bool, LedgerError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [LEDGER_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the ledger table if missing. Returns true if it was created.
    pub fn ensure(&self) -> Result<bool, LedgerError> {
        if self.exists()? {
            return Ok(false);
        }
        self.conn.execute_batch(CREATE_LEDGER)?;
        Ok(true)
    }

    /// Append a row and return its id.
    pub fn append(
        &self,
        version: &Version,
        phase: Phase,
        at: DateTime<Utc>,
    ) -> Result<i64, LedgerError> {
        let updated = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.conn.execute(
            "INSERT INTO version (version, updated, step) VALUES (?1, ?2, ?3)",
            [version.as_str(), updated.as_str(), phase.as_column()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All rows in insertion order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_ENTRIES} ORDER BY id"))?;
        let raw = stmt
            .query_map([], RawEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawEntry::decode).collect()
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM version", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    /// The most recent `Complete` row.
    pub fn latest_complete(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        self.conn
            .query_row(
                &format!("{SELECT_ENTRIES} WHERE step = 'Complete' ORDER BY id DESC LIMIT 1"),
                [],
                RawEntry::from_row,
            )
            .optional()?
            .map(RawEntry::decode)
            .transpose()
    }

    /// The most recent `Upgrade` row with no later `Complete` row at the
    /// same or a higher version.
    pub fn pending_upgrade(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        let entries = self.entries()?;
        let pending = entries.iter().enumerate().rev().find(|(i, entry)| {
            entry.phase == Phase::Upgrading
                && !entries[i + 1..]
                    .iter()
                    .any(|later| later.phase == Phase::Complete && later.version >= entry.version)
        });
        Ok(pending.map(|(_, entry)| entry.clone()))
    }

    /// Append an `Upgrade` row for a step from `from` to `version`, unless
    /// another run got there first.
    ///
    /// Checked and written under one `BEGIN IMMEDIATE` transaction. The only
    /// pending upgrade tolerated is `acknowledged`, one an operator chose to
    /// resume, and the latest `Complete` row must still lie within `from`.
    pub fn claim(
        &self,
        from: &VersionRange,
        version: &Version,
        at: DateTime<Utc>,
        acknowledged: Option<i64>,
    ) -> Result<Claim, LedgerError> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(pending) = self.pending_upgrade()? {
            if Some(pending.id) != acknowledged {
                return Ok(Claim::Pending(pending));
            }
        }
        if let Some(current) = self.latest_complete()? {
            if !from.contains(&current.version) {
                return Ok(Claim::Advanced(current));
            }
        }
        let id = self.append(version, Phase::Upgrading, at)?;
        tx.commit()?;
        Ok(Claim::Granted(id))
    }
}

/// A row before its text columns are validated.
struct RawEntry {
    id: i64,
    version: String,
    updated: String,
    step: String,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            updated: row.get(2)?,
            step: row.get(3)?,
        })
    }

    fn decode(self) -> Result<LedgerEntry, LedgerError> {
        let corrupt = |message: String| LedgerError::Corrupt {
            id: self.id,
            message,
        };
        let version = Version::parse(&self.version).map_err(|e| corrupt(e.to_string()))?;
        let phase = Phase::from_column(&self.step)
            .ok_or_else(|| corrupt(format!("unknown step '{}'", self.step)))?;
        let updated = DateTime::parse_from_rfc3339(&self.updated)
            .map_err(|e| corrupt(format!("bad timestamp '{}': {e}", self.updated)))?
            .with_timezone(&Utc);
        Ok(LedgerEntry {
            id: self.id,
            version,
            phase,
            updated,
        })
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;

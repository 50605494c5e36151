// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Database side of dbup: connections, idempotent DDL helpers, the version
//! ledger, script lookup and current-version resolution.

mod db;
mod ledger;
mod rebuild;
mod resolver;
mod script;
mod statement;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use db::{
    absence, quote_ident, Absence, Connector, ObjectKind, SqliteConnector, DEFAULT_BUSY_TIMEOUT,
};
pub use ledger::{Claim, Ledger, LedgerEntry, LedgerError, Phase, LEDGER_TABLE};
pub use rebuild::DefinitionError;
pub use resolver::{LegacyProbe, LegacyProbes, Probe, ResolveError, VersionResolver};
pub use script::{Script, ScriptError, ScriptLocator, ScriptSource};
pub use statement::{
    column_exists, drop_column_if_exists, drop_key_if_exists, drop_primary_key_if_exists,
    index_exists, table_exists, KeyKind, StatementError,
};

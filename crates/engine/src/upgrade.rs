// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upgrade facade: resolve the current version, build a path through the
//! catalog and hand it to the runner.

use crate::runner::{RunError, RunOptions, RunReport, Runner};
use dbup_core::{Catalog, Clock, MigrationStep, PathError, StepId, Version};
use dbup_storage::{
    Connector, Ledger, LedgerEntry, LedgerError, Phase, ResolveError, VersionResolver,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("cannot open database connection: {0}")]
    Connect(#[source] rusqlite::Error),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("no migration steps are registered")]
    EmptyCatalog,
}

/// Database state as seen before an upgrade.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    /// `None` when an interrupted upgrade hides the current version
    pub current: Option<Version>,
    pub latest: Option<Version>,
    pub ledger: bool,
    /// Upgrade row with no matching completion
    pub pending: Option<LedgerEntry>,
}

impl Status {
    pub fn up_to_date(&self) -> bool {
        match (&self.current, &self.latest) {
            (Some(current), Some(latest)) => current >= latest,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub step: StepId,
    pub rolling_upgrade: bool,
    pub prepare: Vec<String>,
    pub data: Vec<String>,
    pub cleanup: Vec<String>,
    pub has_data_migration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&MigrationStep> for PlannedStep {
    fn from(step: &MigrationStep) -> Self {
        Self {
            step: step.id(),
            rolling_upgrade: step.supports_rolling_upgrade(),
            prepare: step.prepare_scripts().to_vec(),
            data: step.data_scripts().to_vec(),
            cleanup: step.cleanup_scripts().to_vec(),
            has_data_migration: step.data_migration().is_some(),
            description: step.description().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub from: Version,
    pub to: Version,
    pub steps: Vec<PlannedStep>,
}

pub struct Upgrader<C: Connector, K: Clock> {
    catalog: Catalog,
    resolver: VersionResolver,
    runner: Runner<C, K>,
}

impl<C: Connector, K: Clock> Upgrader<C, K> {
    pub fn new(catalog: Catalog, runner: Runner<C, K>) -> Self {
        Self {
            catalog,
            resolver: VersionResolver::default(),
            runner,
        }
    }

    pub fn with_resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn runner(&self) -> &Runner<C, K> {
        &self.runner
    }

    fn connect(&self) -> Result<rusqlite::Connection, UpgradeError> {
        self.runner.connector().connect().map_err(UpgradeError::Connect)
    }

    pub fn current_version(&self) -> Result<Version, UpgradeError> {
        let conn = self.connect()?;
        Ok(self.resolver.current_version(&conn)?)
    }

    pub fn status(&self) -> Result<Status, UpgradeError> {
        let conn = self.connect()?;
        let ledger = Ledger::new(&conn);
        let current = match self.resolver.current_version(&conn) {
            Ok(version) => Some(version),
            Err(ResolveError::Interrupted { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let exists = ledger.exists()?;
        let pending = if exists { ledger.pending_upgrade()? } else { None };
        Ok(Status {
            current,
            latest: self.catalog.latest().cloned(),
            ledger: exists,
            pending,
        })
    }

    pub fn history(&self) -> Result<Vec<LedgerEntry>, UpgradeError> {
        let conn = self.connect()?;
        let ledger = Ledger::new(&conn);
        if !ledger.exists()? {
            return Ok(Vec::new());
        }
        Ok(ledger.entries()?)
    }

    /// The chain of steps from the current version to `target` (default:
    /// the newest version the catalog reaches).
    pub fn plan(&self, target: Option<&Version>) -> Result<Plan, UpgradeError> {
        let from = self.current_version()?;
        let to = self.target(target)?;
        let path = self.catalog.build_path(&from, &to)?;
        Ok(Plan {
            steps: path.into_iter().map(PlannedStep::from).collect(),
            from,
            to,
        })
    }

    /// Resolve, plan and run.
    pub fn upgrade(
        &self,
        target: Option<&Version>,
        options: RunOptions,
    ) -> Result<RunReport, UpgradeError> {
        let from = self.current_version()?;
        let to = self.target(target)?;
        let path = self.catalog.build_path(&from, &to)?;
        if path.is_empty() {
            info!(version = %from, "database is up to date");
        } else {
            info!(from = %from, to = %to, steps = path.len(), "upgrade path resolved");
            if !options.dry_run {
                self.record_baseline(&from)?;
            }
        }
        Ok(self.runner.run(&path, options)?)
    }

    fn target(&self, requested: Option<&Version>) -> Result<Version, UpgradeError> {
        match requested {
            Some(version) => Ok(version.clone()),
            None => self.catalog.latest().cloned().ok_or(UpgradeError::EmptyCatalog),
        }
    }

    /// A database detected by legacy probes gets a ledger whose first row
    /// records the detected version, so a failed first step leaves a
    /// resolvable resume point.
    fn record_baseline(&self, version: &Version) -> Result<(), UpgradeError> {
        let conn = self.connect()?;
        let ledger = Ledger::new(&conn);
        let created = ledger.ensure()?;
        if created || ledger.is_empty()? {
            info!(version = %version, "recording detected legacy version in the ledger");
            ledger.append(version, Phase::Complete, self.runner.clock().utc_now())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "upgrade_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration runner: executes an ordered chain of steps.
//!
//! Each step moves through
//!
//! ```text
//! NotStarted -> Preparing -> DataMigrating -> CleaningUp -> Complete
//!      \____________\______________\______________\______-> Failed
//! ```
//!
//! on its own connection. All of a step's scripts are located before
//! anything executes. An `Upgrade` ledger row is claimed when the step
//! starts and a `Complete` row appended when all three phases succeed. The
//! claim refuses if another process has an upgrade in flight or has moved
//! the database past the step. The run stops at the first failure; earlier
//! steps stay committed and DDL is never rolled back.

use chrono::{DateTime, Utc};
use dbup_core::{BoxError, Clock, IdGen, MigrationStep, RunId, StepId, UuidIdGen, Version};
use dbup_storage::{
    Claim, Connector, Ledger, LedgerError, Phase, Script, ScriptError, ScriptLocator,
};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

/// Where a step is in its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    NotStarted,
    Preparing,
    DataMigrating,
    CleaningUp,
    Complete,
    Failed,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Complete | StepState::Failed)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::NotStarted => "not started",
            StepState::Preparing => "preparing",
            StepState::DataMigrating => "migrating data",
            StepState::CleaningUp => "cleaning up",
            StepState::Complete => "complete",
            StepState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// What a single step phase can fail with.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("cannot open database connection: {0}")]
    Connect(#[source] rusqlite::Error),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("script {script} failed: {source}")]
    Sql {
        script: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("data migration failed: {0}")]
    Data(BoxError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("another upgrade to {version} started at {started} is still in flight")]
    Busy {
        version: Version,
        started: DateTime<Utc>,
    },
    #[error("the database reached {current} while this run was in progress; plan again")]
    Superseded { current: Version },
}

/// A failed step: its identity, the phase it was in, the cause, and the
/// report of the run up to that point.
#[derive(Debug, Error)]
#[error("migration step {step} failed ({phase}): {cause}")]
pub struct MigrationFailed {
    pub step: StepId,
    pub phase: StepState,
    #[source]
    pub cause: StepError,
    pub report: RunReport,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Failed(#[from] Box<MigrationFailed>),
    #[error("cannot open database connection: {0}")]
    Connect(#[source] rusqlite::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(
        "refusing to run: the upgrade to {version} started at {started} never completed; \
         inspect the database, then resume explicitly"
    )]
    Interrupted {
        version: Version,
        started: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Re-run steps even though the ledger shows an unfinished upgrade
    pub resume_interrupted: bool,
    /// Report the steps without touching the database
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: StepId,
    pub state: StepState,
    pub elapsed_ms: u64,
    pub rolling_upgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.state == StepState::Complete)
    }

    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.state == StepState::Failed)
    }

    /// Target of the last step that completed.
    pub fn reached(&self) -> Option<&Version> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.state == StepState::Complete)
            .map(|s| &s.step.target)
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.elapsed_ms).sum()
    }
}

/// Scripts of one step, read before the step starts.
struct StepScripts {
    prepare: Vec<Script>,
    data: Vec<Script>,
    cleanup: Vec<Script>,
}

impl StepScripts {
    fn load(locator: &ScriptLocator, step: &MigrationStep) -> Result<Self, ScriptError> {
        let load_all = |names: &[String]| -> Result<Vec<Script>, ScriptError> {
            names.iter().map(|name| locator.load(name)).collect()
        };
        Ok(Self {
            prepare: load_all(step.prepare_scripts())?,
            data: load_all(step.data_scripts())?,
            cleanup: load_all(step.cleanup_scripts())?,
        })
    }
}

pub struct Runner<C: Connector, K: Clock> {
    connector: C,
    locator: ScriptLocator,
    clock: K,
    ids: Box<dyn IdGen>,
}

impl<C: Connector, K: Clock> Runner<C, K> {
    pub fn new(connector: C, locator: ScriptLocator, clock: K) -> Self {
        Self {
            connector,
            locator,
            clock,
            ids: Box::new(UuidIdGen),
        }
    }

    pub fn with_id_gen(mut self, ids: impl IdGen + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn locator(&self) -> &ScriptLocator {
        &self.locator
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Run `steps` in order, stopping at the first failure.
    pub fn run(
        &self,
        steps: &[&MigrationStep],
        options: RunOptions,
    ) -> Result<RunReport, RunError> {
        let mut report = RunReport {
            run_id: RunId::new(self.ids.next()),
            started_at: self.clock.utc_now(),
            dry_run: options.dry_run,
            steps: steps
                .iter()
                .map(|step| StepReport {
                    step: step.id(),
                    state: StepState::NotStarted,
                    elapsed_ms: 0,
                    rolling_upgrade: step.supports_rolling_upgrade(),
                    error: None,
                })
                .collect(),
        };

        let acknowledged = self.check_ledger(options)?;
        if options.dry_run {
            info!(run_id = %report.run_id, steps = steps.len(), "dry run, nothing executed");
            return Ok(report);
        }

        info!(run_id = %report.run_id, steps = steps.len(), "starting upgrade run");
        for (index, step) in steps.iter().enumerate() {
            let span = info_span!("step", step = %step.id(), run_id = %report.run_id);
            let _guard = span.enter();

            let start = self.clock.now();
            let mut state = StepState::NotStarted;
            let result = self.execute_step(step, acknowledged, &mut state);
            let elapsed = self.clock.now().duration_since(start);
            let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

            let row = &mut report.steps[index];
            row.elapsed_ms = elapsed_ms;
            match result {
                Ok(()) => {
                    row.state = StepState::Complete;
                    info!(elapsed_ms, "completed");
                }
                Err(cause) => {
                    row.state = StepState::Failed;
                    row.error = Some(cause.to_string());
                    error!(elapsed_ms, phase = %state, error = %cause, "failed");
                    return Err(Box::new(MigrationFailed {
                        step: step.id(),
                        phase: state,
                        cause,
                        report,
                    })
                    .into());
                }
            }
        }
        info!(
            run_id = %report.run_id,
            elapsed_ms = report.total_elapsed_ms(),
            "upgrade run complete"
        );
        Ok(report)
    }

    /// Refuse to start while the ledger shows an unfinished upgrade.
    /// Returns the id of the unfinished upgrade an operator chose to resume.
    fn check_ledger(&self, options: RunOptions) -> Result<Option<i64>, RunError> {
        let conn = self.connector.connect().map_err(RunError::Connect)?;
        let ledger = Ledger::new(&conn);
        if options.dry_run && !ledger.exists()? {
            return Ok(None);
        }
        ledger.ensure()?;

        let Some(pending) = ledger.pending_upgrade()? else {
            return Ok(None);
        };
        if !options.resume_interrupted {
            return Err(RunError::Interrupted {
                version: pending.version,
                started: pending.updated,
            });
        }
        warn!(
            version = %pending.version,
            started = %pending.updated,
            "resuming after an interrupted upgrade at operator request"
        );
        Ok(Some(pending.id))
    }

    fn execute_step(
        &self,
        step: &MigrationStep,
        acknowledged: Option<i64>,
        state: &mut StepState,
    ) -> Result<(), StepError> {
        let scripts = StepScripts::load(&self.locator, step)?;
        let conn = self.connector.connect().map_err(StepError::Connect)?;
        let ledger = Ledger::new(&conn);
        let target = step.upgraded_version();

        let claim = ledger.claim(
            step.upgradable_range(),
            target,
            self.clock.utc_now(),
            acknowledged,
        )?;
        match claim {
            Claim::Granted(id) => debug!(ledger_id = id, "claimed"),
            Claim::Pending(entry) => {
                return Err(StepError::Busy {
                    version: entry.version,
                    started: entry.updated,
                })
            }
            Claim::Advanced(entry) => {
                return Err(StepError::Superseded {
                    current: entry.version,
                })
            }
        }
        info!(rolling_upgrade = step.supports_rolling_upgrade(), "starting");

        *state = StepState::Preparing;
        apply_scripts(&conn, &scripts.prepare)?;

        *state = StepState::DataMigrating;
        apply_scripts(&conn, &scripts.data)?;
        if let Some(migration) = step.data_migration() {
            migration.migrate(&conn).map_err(StepError::Data)?;
        }

        *state = StepState::CleaningUp;
        apply_scripts(&conn, &scripts.cleanup)?;

        ledger.append(target, Phase::Complete, self.clock.utc_now())?;
        *state = StepState::Complete;
        Ok(())
    }
}

fn apply_scripts(conn: &Connection, scripts: &[Script]) -> Result<(), StepError> {
    for script in scripts {
        debug!(script = %script.source, "applying");
        conn.execute_batch(&script.sql).map_err(|source| StepError::Sql {
            script: script.name.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

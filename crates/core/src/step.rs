// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration steps: one admissible version-to-version transition.
//!
//! A step is a plain bundle of data and one optional function. It names the
//! scripts to run before and after its data migration and carries the
//! version range it may start from. Variant behavior (an "extended" edition
//! adding scripts) is a separate catalog entry, not a subtype.

use crate::version::{Version, VersionRange};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Error type returned by data-migration functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step-defined data transformation, run between the prepare and cleanup
/// scripts. Must be safe to re-run after a crash.
pub trait DataMigration: Send + Sync {
    fn migrate(&self, conn: &Connection) -> Result<(), BoxError>;
}

impl<F> DataMigration for F
where
    F: Fn(&Connection) -> Result<(), BoxError> + Send + Sync,
{
    fn migrate(&self, conn: &Connection) -> Result<(), BoxError> {
        self(conn)
    }
}

/// Edition of a step. When a base and an extended step cover the same
/// range and target, path building picks the extended one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Base,
    Extended,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Base => write!(f, "base"),
            Variant::Extended => write!(f, "extended"),
        }
    }
}

/// Identity of a step: its range, target and variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId {
    pub range: VersionRange,
    pub target: Version,
    pub variant: Variant,
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.range, self.target)?;
        if self.variant == Variant::Extended {
            write!(f, " (extended)")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MigrationStep {
    range: VersionRange,
    target: Version,
    variant: Variant,
    rolling_upgrade: bool,
    prepare: Vec<String>,
    data_scripts: Vec<String>,
    data: Option<Arc<dyn DataMigration>>,
    cleanup: Vec<String>,
    description: Option<String>,
}

impl MigrationStep {
    pub fn new(range: VersionRange, target: Version) -> Self {
        Self {
            range,
            target,
            variant: Variant::Base,
            rolling_upgrade: false,
            prepare: Vec::new(),
            data_scripts: Vec::new(),
            data: None,
            cleanup: Vec::new(),
            description: None,
        }
    }

    /// Step applicable to exactly one source version.
    pub fn exact(from: Version, target: Version) -> Self {
        Self::new(VersionRange::exact(from), target)
    }

    pub fn prepare(mut self, script: impl Into<String>) -> Self {
        self.prepare.push(script.into());
        self
    }

    pub fn cleanup(mut self, script: impl Into<String>) -> Self {
        self.cleanup.push(script.into());
        self
    }

    /// SQL batch run as part of the data-migration phase, before the
    /// data-migration function (if any).
    pub fn data_script(mut self, script: impl Into<String>) -> Self {
        self.data_scripts.push(script.into());
        self
    }

    pub fn data<F>(self, f: F) -> Self
    where
        F: Fn(&Connection) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.data_with(f)
    }

    pub fn data_with(mut self, migration: impl DataMigration + 'static) -> Self {
        self.data = Some(Arc::new(migration));
        self
    }

    pub fn rolling_upgrade(mut self, rolling: bool) -> Self {
        self.rolling_upgrade = rolling;
        self
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> StepId {
        StepId {
            range: self.range.clone(),
            target: self.target.clone(),
            variant: self.variant,
        }
    }

    pub fn upgradable_range(&self) -> &VersionRange {
        &self.range
    }

    pub fn upgraded_version(&self) -> &Version {
        &self.target
    }

    pub fn variant_kind(&self) -> Variant {
        self.variant
    }

    /// Advisory only; the runner does not enforce it.
    pub fn supports_rolling_upgrade(&self) -> bool {
        self.rolling_upgrade
    }

    pub fn prepare_scripts(&self) -> &[String] {
        &self.prepare
    }

    pub fn data_scripts(&self) -> &[String] {
        &self.data_scripts
    }

    pub fn data_migration(&self) -> Option<&dyn DataMigration> {
        self.data.as_deref()
    }

    pub fn cleanup_scripts(&self) -> &[String] {
        &self.cleanup
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `schema-<from>to<target>.sql`, named after the range's lower bound.
    pub fn conventional_prepare_script(&self) -> String {
        format!(
            "schema-{}to{}.sql",
            self.range.lower.compact(),
            self.target.compact()
        )
    }

    /// `schema-<from>to<target>-cleanup.sql`
    pub fn conventional_cleanup_script(&self) -> String {
        format!(
            "schema-{}to{}-cleanup.sql",
            self.range.lower.compact(),
            self.target.compact()
        )
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("range", &self.range)
            .field("target", &self.target)
            .field("variant", &self.variant)
            .field("rolling_upgrade", &self.rolling_upgrade)
            .field("prepare", &self.prepare)
            .field("data_scripts", &self.data_scripts)
            .field("data", &self.data.is_some())
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;

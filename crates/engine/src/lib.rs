// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbup upgrade engine

pub mod manifest;
mod runner;
mod upgrade;

pub use manifest::{load_catalog, parse_manifest, ManifestError};
pub use runner::{
    MigrationFailed, RunError, RunOptions, RunReport, Runner, StepError, StepReport, StepState,
};
pub use upgrade::{Plan, PlannedStep, Status, UpgradeError, Upgrader};

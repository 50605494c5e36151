// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbup-core: versions, migration steps and the step catalog

pub mod catalog;
pub mod clock;
pub mod id;
pub mod step;
pub mod time_fmt;
pub mod version;

pub use catalog::{Catalog, CatalogError, PathError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdGen, RunId, SequentialIdGen, UuidIdGen};
pub use step::{BoxError, DataMigration, MigrationStep, StepId, Variant};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use version::{Version, VersionError, VersionRange};

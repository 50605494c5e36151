// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step manifest: migration steps declared as TOML data.
//!
//! ```toml
//! [[step]]
//! from = "2.2.2"
//! to = "2.2.3"            # defaults to `from`
//! target = "2.2.4"
//! rolling = false
//! variant = "extended"    # default "base"
//! prepare = ["schema-222to224.sql"]
//! data = ["data-222to224.sql"]
//! cleanup = ["schema-222to224-cleanup.sql"]
//! ```
//!
//! Omitted `prepare` means the conventional `schema-<from>to<target>.sql`.
//! Omitted `cleanup` means the conventional cleanup script, if it exists.

use dbup_core::{Catalog, CatalogError, MigrationStep, Variant, Version, VersionRange};
use dbup_storage::ScriptLocator;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read step manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid step manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid step manifest {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    step: Vec<StepEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepEntry {
    from: Version,
    to: Option<Version>,
    target: Version,
    #[serde(default)]
    rolling: bool,
    #[serde(default)]
    variant: Variant,
    prepare: Option<Vec<String>>,
    #[serde(default)]
    data: Vec<String>,
    cleanup: Option<Vec<String>>,
    description: Option<String>,
}

impl StepEntry {
    fn into_step(self, locator: &ScriptLocator) -> MigrationStep {
        let upper = self.to.unwrap_or_else(|| self.from.clone());
        let mut step = MigrationStep::new(VersionRange::new(self.from, upper), self.target)
            .rolling_upgrade(self.rolling)
            .variant(self.variant);
        if let Some(description) = self.description {
            step = step.describe(description);
        }

        let prepare = self
            .prepare
            .unwrap_or_else(|| vec![step.conventional_prepare_script()]);
        let cleanup = self.cleanup.unwrap_or_else(|| {
            let conventional = step.conventional_cleanup_script();
            if locator.contains(&conventional) {
                vec![conventional]
            } else {
                Vec::new()
            }
        });

        let step = prepare.into_iter().fold(step, MigrationStep::prepare);
        let step = self.data.into_iter().fold(step, MigrationStep::data_script);
        cleanup.into_iter().fold(step, MigrationStep::cleanup)
    }
}

/// Parse manifest text into steps, in declaration order.
pub fn parse_manifest(
    text: &str,
    locator: &ScriptLocator,
) -> Result<Vec<MigrationStep>, toml::de::Error> {
    let file: ManifestFile = toml::from_str(text)?;
    Ok(file
        .step
        .into_iter()
        .map(|entry| entry.into_step(locator))
        .collect())
}

/// Read a manifest file and build a validated catalog from it.
pub fn load_catalog(path: &Path, locator: &ScriptLocator) -> Result<Catalog, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let steps = parse_manifest(&text, locator).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Catalog::from_steps(steps).map_err(|source| ManifestError::Catalog {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;

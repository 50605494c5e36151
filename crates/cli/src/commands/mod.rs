// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod history;
pub mod plan;
pub mod status;
pub mod upgrade;

use anyhow::{Context as _, Result};
use dbup_core::{Catalog, SystemClock};
use dbup_engine::{load_catalog, Runner, Upgrader};
use dbup_storage::{ScriptLocator, SqliteConnector};

use crate::config::Config;

pub type CliUpgrader = Upgrader<SqliteConnector, SystemClock>;

/// Everything a command needs, built once from the loaded config.
pub struct Context {
    pub config: Config,
    pub upgrader: CliUpgrader,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        if !config.database.path.is_file() {
            anyhow::bail!("database not found: {}", config.database.path.display());
        }

        let locator = ScriptLocator::with_search_path(config.scripts.search_path.iter().cloned());
        let mut catalog = match &config.upgrade.manifest {
            Some(path) => load_catalog(path, &locator)
                .with_context(|| format!("cannot load step manifest {}", path.display()))?,
            None => {
                tracing::warn!("no step manifest configured, catalog is empty");
                Catalog::new()
            }
        };
        for (frontier, target) in &config.upgrade.prefer {
            catalog.prefer(frontier.clone(), target.clone());
        }
        tracing::debug!(steps = catalog.len(), "step catalog loaded");

        let connector = SqliteConnector::new(&config.database.path)
            .with_busy_timeout(config.database.busy_timeout());
        let runner = Runner::new(connector, locator, SystemClock);
        Ok(Self {
            upgrader: Upgrader::new(catalog, runner),
            config,
        })
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

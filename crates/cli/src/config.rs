// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbup.toml` loading.
//!
//! Relative paths in the file are resolved against the directory holding
//! the file, so a config can be checked in next to the database and the
//! script directories it names.

use dbup_core::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG: &str = "dbup.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub upgrade: UpgradeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cloud.db")
}

fn default_busy_timeout_ms() -> u64 {
    dbup_storage::DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeConfig {
    pub target: Option<Version>,
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub resume_interrupted: bool,
    /// Frontier version -> target to take when overlapping steps apply
    #[serde(default)]
    pub prefer: BTreeMap<Version, Version>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read `path` and resolve its relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rebased(base))
    }

    /// Find and load the config file. With no file anywhere, defaults
    /// relative to `cwd` are used.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        match locate(explicit, cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default().rebased(cwd))
            }
        }
    }

    fn rebased(mut self, base: &Path) -> Self {
        self.database.path = base.join(&self.database.path);
        self.scripts.search_path = self
            .scripts
            .search_path
            .iter()
            .map(|dir| base.join(dir))
            .collect();
        if self.scripts.search_path.is_empty() {
            self.scripts.search_path.push(base.to_path_buf());
        }
        self.upgrade.manifest = self.upgrade.manifest.map(|m| base.join(m));
        self
    }
}

/// `explicit` > `DBUP_CONFIG` > `./dbup.toml` > user config dir.
///
/// An explicitly named file is returned even when missing so that loading
/// reports it; the fallbacks are only used when they exist.
pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(cwd.join(path));
    }
    if let Some(path) = crate::env::config_path() {
        return Some(cwd.join(path));
    }
    let local = cwd.join(LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }
    crate::env::user_config_path().filter(|p| p.is_file())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

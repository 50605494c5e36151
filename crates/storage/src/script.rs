// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script Locator: resolves a named SQL script to its contents.
//!
//! Names are looked up in each search directory in order, then among
//! embedded scripts. The first hit wins; no hit is an error, and so is a
//! script with no statements in it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script {name} not found (searched: {})", display_dirs(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("script {0} is empty")]
    Empty(ScriptSource),
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "no search path, no embedded match".to_string();
    }
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where a script was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Embedded(String),
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptSource::File(path) => write!(f, "{}", path.display()),
            ScriptSource::Embedded(name) => write!(f, "embedded:{name}"),
        }
    }
}

/// A located, non-empty script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub source: ScriptSource,
    pub sql: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptLocator {
    search_path: Vec<PathBuf>,
    embedded: BTreeMap<String, String>,
}

impl ScriptLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_path: dirs.into_iter().map(Into::into).collect(),
            embedded: BTreeMap::new(),
        }
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.search_path.push(dir.into());
        self
    }

    /// Register a script compiled into the binary (e.g. with `include_str!`).
    pub fn embed(&mut self, name: impl Into<String>, sql: impl Into<String>) -> &mut Self {
        self.embedded.insert(name.into(), sql.into());
        self
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Resolve `name` without reading it.
    pub fn find_script(&self, name: &str) -> Result<ScriptSource, ScriptError> {
        if let Some(path) = self
            .search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|p| p.is_file())
        {
            return Ok(ScriptSource::File(path));
        }
        if self.embedded.contains_key(name) {
            return Ok(ScriptSource::Embedded(name.to_string()));
        }
        Err(ScriptError::NotFound {
            name: name.to_string(),
            searched: self.search_path.clone(),
        })
    }

    /// Whether `name` resolves anywhere.
    pub fn contains(&self, name: &str) -> bool {
        self.find_script(name).is_ok()
    }

    /// Resolve and read `name`, rejecting scripts with no content.
    pub fn load(&self, name: &str) -> Result<Script, ScriptError> {
        let source = self.find_script(name)?;
        let sql = match &source {
            ScriptSource::File(path) => read_file(path)?,
            ScriptSource::Embedded(key) => self.embedded.get(key).cloned().unwrap_or_default(),
        };
        if is_blank(&sql) {
            return Err(ScriptError::Empty(source));
        }
        Ok(Script {
            name: name.to_string(),
            source,
            sql,
        })
    }
}

fn read_file(path: &Path) -> Result<String, ScriptError> {
    std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// True when `sql` has nothing but whitespace and `--` line comments.
fn is_blank(sql: &str) -> bool {
    sql.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;

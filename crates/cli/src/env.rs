// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;

/// Filter directives for log output (`tracing_subscriber::EnvFilter` syntax)
pub const LOG_ENV: &str = "DBUP_LOG";

/// Config file path override
pub const CONFIG_ENV: &str = "DBUP_CONFIG";

pub fn config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// `$XDG_CONFIG_HOME/dbup/dbup.toml` (or the platform equivalent)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dbup").join("dbup.toml"))
}

/// `NO_COLOR=1` disables colored output
pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

/// `COLOR=1` forces colored output even when stdout is not a terminal
pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

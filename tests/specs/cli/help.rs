//! CLI help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("status")
        .stdout_has("plan")
        .stdout_has("upgrade")
        .stdout_has("history");
}

#[test]
fn upgrade_help_shows_flags() {
    cli()
        .args(&["upgrade", "--help"])
        .passes()
        .stdout_has("--target")
        .stdout_has("--resume-interrupted")
        .stdout_has("--dry-run");
}

#[test]
fn version_flag_prints_version() {
    cli().args(&["--version"]).passes().stdout_has("dbup ");
}

#[test]
fn no_subcommand_fails_with_usage() {
    let run = cli().fails();
    assert!(run.stderr().contains("Usage:"), "stderr: {}", run.stderr());
}

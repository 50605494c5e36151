//! CLI error handling specs

use crate::prelude::*;

#[test]
fn unknown_command_is_rejected() {
    cli()
        .args(&["migrate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn malformed_target_is_rejected() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["plan", "--target", "latest"])
        .fails()
        .stderr_has("not a number");
}

#[test]
fn missing_database_is_reported() {
    let project = Project::empty();
    project.file("dbup.toml", CONFIG);
    project
        .dbup()
        .args(&["status"])
        .fails()
        .stderr_has("database not found");
}

#[test]
fn unknown_database_schema_is_reported() {
    let project = Project::legacy();
    project.schema("DROP TABLE configuration; CREATE TABLE unrelated (id INTEGER);");
    let run = project.dbup().args(&["upgrade"]).fails();
    assert_eq!(run.code(), Some(1));
    assert!(run.stderr().contains("Error:"), "stderr: {}", run.stderr());
}

#[test]
fn unreachable_target_is_reported() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["upgrade", "--target", "3.0.0"])
        .fails()
        .stderr_has("3.0.0");
    assert_eq!(
        project.count("SELECT count(*) FROM sqlite_master WHERE name = 'version'"),
        0
    );
}

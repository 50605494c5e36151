//! Config discovery specs

use crate::prelude::*;

#[test]
fn explicit_config_flag_is_used() {
    let project = Project::legacy();
    std::fs::rename(project.path().join("dbup.toml"), project.path().join("alt.toml")).unwrap();

    project
        .dbup()
        .args(&["--config", "alt.toml", "status"])
        .passes()
        .stdout_has("current:  2.1.7");
}

#[test]
fn config_env_var_is_used() {
    let project = Project::legacy();
    std::fs::rename(project.path().join("dbup.toml"), project.path().join("env.toml")).unwrap();

    project
        .dbup()
        .env("DBUP_CONFIG", project.path().join("env.toml"))
        .args(&["status"])
        .passes()
        .stdout_has("current:  2.1.7");
}

#[test]
fn unknown_config_keys_are_rejected() {
    let project = Project::legacy();
    project.file("dbup.toml", "[database]\nurl = \"postgres://\"\n");
    project
        .dbup()
        .args(&["status"])
        .fails()
        .stderr_has("invalid config");
}

#[test]
fn config_target_limits_upgrade() {
    let project = Project::legacy();
    project.file("dbup.toml", &format!("{CONFIG}target = \"2.1.8\"\n"));

    project.dbup().args(&["upgrade"]).passes();
    project
        .dbup()
        .args(&["status"])
        .passes()
        .stdout_has("current:  2.1.8");
}

#[test]
fn logs_go_to_stderr() {
    let project = Project::legacy();
    let run = project
        .dbup()
        .env("DBUP_LOG", "info")
        .args(&["-o", "json", "upgrade"])
        .passes();
    run.json();
    assert!(run.stderr().contains("upgrade path resolved"), "stderr: {}", run.stderr());
}

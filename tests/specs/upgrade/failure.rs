//! Failed and interrupted upgrade specs

use crate::prelude::*;

fn broken_project() -> Project {
    let project = Project::legacy();
    project.file(
        "db/schema-218to224.sql",
        "CREATE TABLE firewall_rules (id INTEGER);\nINSERT INTO missing VALUES (1);",
    );
    project
}

#[test]
fn failed_step_reports_partial_progress() {
    let project = broken_project();
    let run = project.dbup().args(&["upgrade"]).fails();
    assert_eq!(run.code(), Some(1));

    let stdout = run.stdout();
    assert!(stdout.contains("2.1.7 -> 2.1.8  complete"), "stdout: {stdout}");
    assert!(stdout.contains("Upgrade stopped at step 2.1.8 -> 2.2.4"), "stdout: {stdout}");
    assert!(
        run.stderr().contains("migration step 2.1.8 -> 2.2.4 failed"),
        "stderr: {}",
        run.stderr()
    );
}

#[test]
fn failed_step_keeps_previous_version() {
    let project = broken_project();
    project.dbup().args(&["upgrade"]).fails();

    let status = project.dbup().args(&["-o", "json", "status"]).passes().json();
    assert_eq!(status["current"], "2.1.8");
    assert_eq!(status["pending"]["version"], "2.2.4");
    assert_eq!(status["pending"]["phase"], "upgrading");
}

#[test]
fn interrupted_upgrade_blocks_next_run() {
    let project = broken_project();
    project.dbup().args(&["upgrade"]).fails();

    project
        .dbup()
        .args(&["upgrade"])
        .fails()
        .stderr_has("never completed");
}

#[test]
fn resume_after_fixing_script() {
    let project = broken_project();
    project.dbup().args(&["upgrade"]).fails();
    let fixed = SCRIPT_218_TO_224.replace("CREATE TABLE", "CREATE TABLE IF NOT EXISTS");
    project.file("db/schema-218to224.sql", &fixed);

    project
        .dbup()
        .args(&["upgrade", "--resume-interrupted"])
        .passes()
        .stdout_has("Upgraded to 2.2.4");
    project
        .dbup()
        .args(&["status"])
        .passes()
        .stdout_has("state:    ok");
}

#[test]
fn missing_script_fails_before_any_statement() {
    let project = Project::legacy();
    std::fs::remove_file(project.path().join("db/schema-217to218.sql")).unwrap();

    project
        .dbup()
        .args(&["upgrade"])
        .fails()
        .stderr_has("schema-217to218.sql");
    assert_eq!(
        project.count("SELECT count(*) FROM sqlite_master WHERE name = 'nics'"),
        0
    );
}

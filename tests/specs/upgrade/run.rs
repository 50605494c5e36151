//! `dbup upgrade` specs

use crate::prelude::*;

#[test]
fn upgrade_applies_all_steps() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["upgrade"])
        .passes()
        .stdout_has("2.1.7 -> 2.1.8  complete")
        .stdout_has("2.1.8 -> 2.2.4  complete")
        .stdout_has("Upgraded to 2.2.4");

    assert_eq!(project.count("SELECT count(*) FROM firewall_rules"), 0);
    assert_eq!(
        project.count("SELECT count(*) FROM version WHERE step = 'Complete'"),
        3
    );
}

#[test]
fn second_upgrade_has_nothing_to_do() {
    let project = Project::legacy();
    project.dbup().args(&["upgrade"]).passes();
    project
        .dbup()
        .args(&["upgrade"])
        .passes()
        .stdout_eq("Nothing to upgrade\n");
}

#[test]
fn dry_run_changes_nothing() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["upgrade", "--dry-run"])
        .passes()
        .stdout_has("Dry run, no changes made")
        .stdout_has("not started")
        .stdout_has("Would upgrade to 2.2.4");
    assert_eq!(
        project.count("SELECT count(*) FROM sqlite_master WHERE name IN ('version', 'nics')"),
        0
    );
}

#[test]
fn upgrade_report_json() {
    let project = Project::legacy();
    let report = project.dbup().args(&["upgrade", "-o", "json"]).passes().json();
    assert_eq!(report["dry_run"], false);
    let states: Vec<_> = report["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["state"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(states, ["complete", "complete"]);
    assert!(report["run_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn cleanup_script_runs_after_prepare() {
    let project = Project::legacy();
    project.schema("CREATE TABLE legacy_nics (id INTEGER);");
    project.file("db/schema-217to218-cleanup.sql", "DROP TABLE legacy_nics;");

    project.dbup().args(&["upgrade"]).passes();
    assert_eq!(
        project.count("SELECT count(*) FROM sqlite_master WHERE name = 'legacy_nics'"),
        0
    );
}

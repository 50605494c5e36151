//! `dbup status` specs

use crate::prelude::*;

#[test]
fn legacy_database_is_behind() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["status"])
        .passes()
        .stdout_has("current:  2.1.7\n")
        .stdout_has("latest:   2.2.4\n")
        .stdout_has("ledger:   no\n")
        .stdout_has("state:    behind\n");
}

#[test]
fn upgraded_database_is_ok() {
    let project = Project::legacy();
    project.dbup().args(&["upgrade"]).passes();
    project
        .dbup()
        .args(&["status"])
        .passes()
        .stdout_has("current:  2.2.4\n")
        .stdout_has("ledger:   yes\n")
        .stdout_has("state:    ok\n");
}

#[test]
fn status_json() {
    let project = Project::legacy();
    let status = project.dbup().args(&["-o", "json", "status"]).passes().json();
    assert_eq!(status["current"], "2.1.7");
    assert_eq!(status["latest"], "2.2.4");
    assert_eq!(status["ledger"], false);
    assert_eq!(status["up_to_date"], false);
    assert!(status["pending"].is_null());
}

//! `dbup history` specs

use crate::prelude::*;

#[test]
fn fresh_database_has_no_history() {
    let project = Project::legacy();
    project
        .dbup()
        .args(&["history"])
        .passes()
        .stdout_eq("No upgrade history recorded\n");
}

#[test]
fn history_records_baseline_and_steps() {
    let project = Project::legacy();
    project.dbup().args(&["upgrade"]).passes();

    let rows = project.dbup().args(&["history", "-o", "json"]).passes().json();
    let rows: Vec<_> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r["version"].as_str().unwrap(), r["phase"].as_str().unwrap()))
        .collect();
    assert_eq!(
        rows,
        [
            "2.1.7 complete",
            "2.1.8 upgrading",
            "2.1.8 complete",
            "2.2.4 upgrading",
            "2.2.4 complete",
        ]
    );
}

#[test]
fn history_table_has_header() {
    let project = Project::legacy();
    project.dbup().args(&["upgrade"]).passes();
    project
        .dbup()
        .args(&["history"])
        .passes()
        .stdout_has("ID  VERSION  PHASE      UPDATED\n")
        .stdout_has(" 5  2.2.4    complete");
}

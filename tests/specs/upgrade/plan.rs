//! `dbup plan` specs

use crate::prelude::*;

#[test]
fn plan_lists_step_chain() {
    let project = Project::legacy();
    project.dbup().args(&["plan"]).passes().stdout_eq(concat!(
        "Upgrade 2.1.7 -> 2.2.4 (2 steps)\n",
        "\n",
        "STEP            ROLLING  SCRIPTS              DESCRIPTION\n",
        "2.1.7 -> 2.1.8  no       schema-217to218.sql  \n",
        "2.1.8 -> 2.2.4  no       schema-218to224.sql  firewall rules\n",
    ));
}

#[test]
fn plan_does_not_touch_database() {
    let project = Project::legacy();
    project.dbup().args(&["plan"]).passes();
    assert_eq!(
        project.count("SELECT count(*) FROM sqlite_master WHERE name IN ('version', 'nics')"),
        0
    );
}

#[test]
fn plan_to_explicit_target() {
    let project = Project::legacy();
    let plan = project
        .dbup()
        .args(&["plan", "--target", "2.1.8", "-o", "json"])
        .passes()
        .json();
    assert_eq!(plan["from"], "2.1.7");
    assert_eq!(plan["to"], "2.1.8");
    assert_eq!(plan["steps"][0]["prepare"][0], "schema-217to218.sql");
}

#[test]
fn up_to_date_plan_is_empty() {
    let project = Project::legacy();
    project.dbup().args(&["upgrade"]).passes();
    project
        .dbup()
        .args(&["plan"])
        .passes()
        .stdout_eq("Database is at 2.2.4, nothing to plan for 2.2.4\n");
}

#[test]
fn preferred_branch_is_taken() {
    let project = Project::legacy();
    project.file(
        "steps.toml",
        &format!(
            "{MANIFEST}\n[[step]]\nfrom = \"2.1.8\"\ntarget = \"2.2.0\"\nprepare = []\n\n[[step]]\nfrom = \"2.2.0\"\ntarget = \"2.2.4\"\nprepare = []\n"
        ),
    );
    project.file("dbup.toml", &format!("{CONFIG}prefer = {{ \"2.1.8\" = \"2.2.0\" }}\n"));

    let plan = project.dbup().args(&["-o", "json", "plan"]).passes().json();
    let targets: Vec<_> = plan["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["step"]["target"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(targets, ["2.1.8", "2.2.0", "2.2.4"]);
}

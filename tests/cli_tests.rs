use std::path::Path;
use std::process::{Command, Output};

use sde_editors::logging::log_file_name;

mod support;

fn sde_editors(cwd: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sde-editors"));
    command.current_dir(cwd).env_remove("RUST_LOG").env_remove("SDE_EDITORS_CONFIG");
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Runs a snapshot audit into `<tmp>/out` and returns the temp dir.
fn audited_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .arg("audit")
        .arg("--config")
        .arg(support::fixture_path("config.toml"))
        .arg("--csv")
        .arg(support::fixture_path("members.csv"))
        .arg("--role-tables")
        .arg(support::fixture_path("role_tables.json"))
        .arg("--output-dir")
        .arg("out")
        .arg("--export-csv")
        .output()
        .expect("should run sde-editors binary");
    assert!(
        output.status.success(),
        "audit failed with {:?}:\n{}",
        output.status,
        stderr(&output)
    );
    dir
}

#[test]
fn audit_replays_snapshot_and_writes_outputs() {
    let dir = audited_dir();
    let out = dir.path().join("out");

    assert!(out.join("groups_and_editors.json").is_file());
    assert!(out.join("groups_and_tables.json").is_file());
    insta::assert_snapshot!(support::read(&out.join("report_multi_table_editors.csv")), @r#"
    Table,User,Granting Group
    PARKS,"Doe, Jane",GIS_PARKS
    PARKS,"Roe, Rick",GIS_PARKS
    STREETS,"Doe, Jane",GIS_ROADS
    TRAILS,"Doe, Jane",GIS_PARKS
    TRAILS,"Doe, Jane",GIS_ROADS
    TRAILS,"Roe, Rick",GIS_PARKS
    "#);
}

#[test]
fn audit_prints_report_to_stdout_and_logs_to_dated_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .args(["audit", "--config"])
        .arg(support::fixture_path("config.toml"))
        .arg("--csv")
        .arg(support::fixture_path("members.csv"))
        .arg("--role-tables")
        .arg(support::fixture_path("role_tables.json"))
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(0), "stderr:\n{}", stderr(&output));
    assert!(
        stdout(&output).starts_with("Table: PARKS\nEditors: ['Doe, Jane', 'Roe, Rick']\n\n"),
        "unexpected stdout:\n{}",
        stdout(&output)
    );

    let log = support::read(&dir.path().join(log_file_name()));
    assert!(
        log.contains("| INFO | FUNCTION: run_audit | Msgs: 1/1) Database: prod_rw"),
        "unexpected log:\n{log}"
    );
    assert!(
        log.contains("| WARNING | FUNCTION: unbridged_roles | Msgs: Role HRM_LEGACY_EDIT"),
        "unexpected log:\n{log}"
    );
    assert!(!log.contains("hunter2"), "descriptor leaked into log:\n{log}");
}

#[test]
fn audit_with_missing_csv_exits_with_code_2() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .args(["audit", "--csv", "absent.csv", "--role-tables"])
        .arg(support::fixture_path("role_tables.json"))
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("File not found: absent.csv"),
        "unexpected stderr:\n{}",
        stderr(&output)
    );
    assert!(!dir.path().join("groups_and_editors.json").exists());
}

#[test]
fn audit_with_unknown_target_exits_with_code_2() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .args(["audit", "--target", "dev_rw", "--config"])
        .arg(support::fixture_path("config.toml"))
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("Unknown catalog target 'dev_rw'"),
        "unexpected stderr:\n{}",
        stderr(&output)
    );
}

#[test]
fn audit_without_config_or_snapshot_exits_with_code_2() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .arg("audit")
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("config.toml"), "{}", stderr(&output));

    let log = support::read(&dir.path().join(log_file_name()));
    assert!(
        log.contains("| ERROR |") && log.contains("File not found") && log.contains("config.toml"),
        "config failure missing from log:\n{log}"
    );
}

#[test]
fn invalid_config_is_logged_to_the_dated_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[audit]\ntarget = \"prod_rw\"\n").expect("should write config");

    let output = sde_editors(dir.path())
        .arg("audit")
        .arg("--config")
        .arg(&config)
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(2));
    let log = support::read(&dir.path().join(log_file_name()));
    assert!(
        log.contains("| ERROR |") && log.contains("Invalid configuration"),
        "config failure missing from log:\n{log}"
    );
}

#[test]
fn table_view_lists_editors_with_granting_groups() {
    let dir = audited_dir();
    let output = sde_editors(dir.path())
        .args(["table", "TRAILS", "--data-dir", "out"])
        .output()
        .expect("should run sde-editors binary");

    assert!(output.status.success(), "{}", stderr(&output));
    insta::assert_snapshot!(stdout(&output), @r"
    Table view: TRAILS
    Granting groups: GIS_PARKS, GIS_ROADS
    Editors (2):
      Doe, Jane  [GIS_PARKS, GIS_ROADS]
      Roe, Rick  [GIS_PARKS]
    ");
}

#[test]
fn table_view_group_filter_narrows_editors() {
    let dir = audited_dir();
    let output = sde_editors(dir.path())
        .args(["table", "PARKS", "TRAILS", "--group", "GIS_ROADS", "--data-dir", "out"])
        .output()
        .expect("should run sde-editors binary");

    assert!(output.status.success(), "{}", stderr(&output));
    insta::assert_snapshot!(stdout(&output), @r"
    Table view: 2 tables
    Granting groups: GIS_PARKS, GIS_ROADS
    Editors (1):
      Doe, Jane  [GIS_PARKS, GIS_ROADS]
    ");
}

#[test]
fn unknown_table_has_no_editors() {
    let dir = audited_dir();
    let output = sde_editors(dir.path())
        .args(["table", "NOPE", "--data-dir", "out"])
        .output()
        .expect("should run sde-editors binary");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Table view: NOPE\nGranting groups: (none)\nNo users with edit access.\n"
    );
}

#[test]
fn user_view_exports_deduplicated_rows() {
    let dir = audited_dir();
    let output = sde_editors(dir.path())
        .args(["user", "Doe, Jane", "--data-dir", "out", "--export-to", "exports"])
        .output()
        .expect("should run sde-editors binary");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output).starts_with(
            "User view: Doe, Jane\nGroups: GIS_PARKS, GIS_ROADS\nTables (3):\n  PARKS  [GIS_PARKS]\n"
        ),
        "unexpected stdout:\n{}",
        stdout(&output)
    );

    let export = dir.path().join("exports").join("user_Doe_Jane_tables.csv");
    insta::assert_snapshot!(support::read(&export), @r#"
    User,Table,Granting Group
    "Doe, Jane",PARKS,GIS_PARKS
    "Doe, Jane",STREETS,GIS_ROADS
    "Doe, Jane",TRAILS,GIS_PARKS
    "Doe, Jane",TRAILS,GIS_ROADS
    "#);
}

#[test]
fn group_view_skips_placeholder_members() {
    let dir = audited_dir();
    let output = sde_editors(dir.path())
        .args(["group", "GIS_EMPTY", "GIS_ROADS", "--data-dir", "out", "--export-to", "."])
        .output()
        .expect("should run sde-editors binary");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output).starts_with(
            "Group view: 2 groups\nMembers (1):\n  Doe, Jane\nTables (2):\n  STREETS\n  TRAILS\n"
        ),
        "unexpected stdout:\n{}",
        stdout(&output)
    );
    assert_eq!(
        support::read(&dir.path().join("group_multi_tables.csv")),
        "Group,Table\nGIS_EMPTY,STREETS\nGIS_ROADS,STREETS\nGIS_ROADS,TRAILS\n"
    );
}

#[test]
fn inspection_without_data_files_exits_with_code_2() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let output = sde_editors(dir.path())
        .args(["group", "GIS_PARKS"])
        .output()
        .expect("should run sde-editors binary");

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("groups_and_editors.json"),
        "unexpected stderr:\n{}",
        stderr(&output)
    );
}

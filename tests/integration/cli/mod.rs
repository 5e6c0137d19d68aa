//! Runs the `boardsync` binary against a temp data dir.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn boardsync(home: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("boardsync");
    cmd.current_dir(home);
    cmd.env("BOARDSYNC_DATA_DIR", home.join("data"));
    cmd.env("BOARDSYNC_CONFIG_DIR", home.join("config"));
    cmd.env_remove("BOARDSYNC_CACHE_PATH");
    cmd.env_remove("BOARDSYNC_LOG");
    cmd
}

const LEGACY: &str = r#"{
    "projects": [{
        "id": "prj-a",
        "title": "Roadmap",
        "columns": [{"id": "doing", "title": "Doing", "wip": 1}],
        "tasks": [
            {"id": "a", "name": "A", "status": "doing", "dependsOn": ["b"]},
            {"id": "b", "name": "B", "status": "doing", "dependsOn": ["a"]}
        ]
    }]
}"#;

#[test]
fn show_on_empty_cache() {
    let home = TempDir::new().unwrap();
    boardsync(home.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("no projects"));
}

#[test]
fn import_then_show_and_export() {
    let home = TempDir::new().unwrap();
    let blob = home.path().join("legacy.json");
    fs::write(&blob, LEGACY).unwrap();

    boardsync(home.path())
        .arg("import")
        .arg(&blob)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 1 project(s), 2 card(s)"));
    assert!(home.path().join("data/state.json").exists());

    boardsync(home.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Roadmap").and(predicate::str::contains("2 cards")));

    let out = home.path().join("export.json");
    boardsync(home.path())
        .args(["export", "--out"])
        .arg(&out)
        .assert()
        .success();
    let exported = fs::read_to_string(&out).unwrap();
    assert!(exported.contains("boardsync-export/1"));
    assert!(exported.contains("Roadmap"));
}

#[test]
fn check_flags_wip_overflow_with_exit_status() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("board.json");
    fs::write(&cache, LEGACY).unwrap();

    boardsync(home.path())
        .arg("--cache")
        .arg(&cache)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("closes a cycle"))
        .stdout(predicate::str::contains("WIP limit of 1"));
}

#[test]
fn check_passes_on_a_clean_cache() {
    let home = TempDir::new().unwrap();
    let blob = home.path().join("clean.json");
    fs::write(
        &blob,
        r#"{"schema_version":3,"projects":[{"id":"prj-a","name":"Ops","columns":[{"id":"col-a","name":"Todo"}]}]}"#,
    )
    .unwrap();
    boardsync(home.path()).arg("import").arg(&blob).assert().success();

    boardsync(home.path())
        .args(["check", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""ok": true"#));
}

#[test]
fn migrate_prints_repairs_on_stderr() {
    let home = TempDir::new().unwrap();
    let raw = home.path().join("raw.json");
    fs::write(&raw, LEGACY).unwrap();

    boardsync(home.path())
        .arg("migrate")
        .arg(&raw)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""schema_version": 3"#))
        .stderr(predicate::str::contains("repaired:"));
}

#[test]
fn import_rejects_non_json() {
    let home = TempDir::new().unwrap();
    let junk = home.path().join("junk.txt");
    fs::write(&junk, "<html>").unwrap();

    boardsync(home.path())
        .arg("import")
        .arg(&junk)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn workspace_config_points_at_cache() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("elsewhere/board.json");
    fs::write(
        home.path().join("boardsync.toml"),
        format!("[cache]\npath = {:?}\n", cache.display().to_string()),
    )
    .unwrap();
    let blob = home.path().join("legacy.json");
    fs::write(&blob, LEGACY).unwrap();

    boardsync(home.path()).arg("import").arg(&blob).assert().success();
    assert!(cache.exists());
}

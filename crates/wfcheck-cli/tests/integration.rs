#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn wfcheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wfcheck").unwrap();
    cmd.current_dir(dir.path())
        .env("WFCHECK_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write_workflow(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let wf = dir.path().join(".github/workflows");
    std::fs::create_dir_all(&wf).unwrap();
    let path = wf.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn workflow_with(actions: &[&str]) -> String {
    let mut yaml = String::from(
        "name: CI\non:\n  push:\n    branches: [main]\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n",
    );
    for action in actions {
        yaml.push_str(&format!("      - uses: {action}\n"));
    }
    yaml
}

// ---------------------------------------------------------------------------
// wfcheck check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_clean_workflows() {
    let dir = TempDir::new().unwrap();
    write_workflow(
        &dir,
        "ci.yml",
        &workflow_with(&["actions/checkout@v4", "actions/setup-java@v4"]),
    );

    wfcheck(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validating .github/workflows/ci.yml..."))
        .stdout(predicate::str::contains("✓ .github/workflows/ci.yml validation passed"))
        .stdout(predicate::str::contains("All 1 workflow file(s) passed"));
}

#[test]
fn check_reports_deprecated_with_fix() {
    let dir = TempDir::new().unwrap();
    write_workflow(
        &dir,
        "ci.yml",
        &workflow_with(&["actions/checkout@v3", "actions/setup-java@v4"]),
    );

    wfcheck(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ Issues found in .github/workflows/ci.yml:"))
        .stdout(predicate::str::contains("[DEPRECATED] (line 9)"))
        .stdout(predicate::str::contains(
            "→ Suggested fix: actions/checkout@v3 → actions/checkout@v4",
        ))
        .stdout(predicate::str::contains("→ Fix command: sed -i.bak"))
        .stderr(predicate::str::contains("1 of 1 workflow file(s) failed"));
}

#[test]
fn check_reports_every_category() {
    let dir = TempDir::new().unwrap();
    write_workflow(
        &dir,
        "ci.yml",
        &workflow_with(&[
            "actions/checkout@main",
            "actions/cache",
            "actions/setup-node@1.0.0",
            "docker://alpine:latest",
        ]),
    );
    write_workflow(&dir, "partial.yml", "name: Partial\non: push\n");
    write_workflow(&dir, "broken.yml", "name: broken\njobs: [unclosed\n");

    let out = wfcheck(&dir).arg("check").assert().failure();
    out.stdout(predicate::str::contains("[INVALID VERSION]"))
        .stdout(predicate::str::contains("[MISSING VERSION]"))
        .stdout(predicate::str::contains("[MISSING PROPERTY]"))
        .stdout(predicate::str::contains("[YAML SYNTAX]"))
        .stdout(predicate::str::contains("floating branch reference"))
        .stdout(predicate::str::contains("latest tag is not reproducible"))
        .stderr(predicate::str::contains("3 of 3 workflow file(s) failed"));
}

#[test]
fn check_one_bad_file_does_not_hide_others() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "a.yml", "name: [oops\n");
    write_workflow(&dir, "b.yml", &workflow_with(&["actions/checkout@v4"]));

    wfcheck(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("✓ .github/workflows/b.yml validation passed"))
        .stderr(predicate::str::contains("1 of 2 workflow file(s) failed"));
}

#[test]
fn check_advisories_only_fail_in_strict_mode() {
    let dir = TempDir::new().unwrap();
    write_workflow(
        &dir,
        "ci.yml",
        &workflow_with(&["actions/checkout@8e5e7e5ab8b370d6c329ec480221332ada57f0ab"]),
    );

    wfcheck(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARNING]"))
        .stdout(predicate::str::contains("commit SHA"));

    wfcheck(&dir).args(["check", "--strict"]).assert().failure();
}

#[test]
fn check_explicit_files() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["actions/checkout@v4"]));
    write_workflow(&dir, "bad.yml", &workflow_with(&["actions/checkout@v2"]));

    wfcheck(&dir)
        .args(["check", ".github/workflows/ci.yml"])
        .assert()
        .success();
}

#[test]
fn check_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    wfcheck(&dir)
        .args(["check", "nope.yml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERROR]"))
        .stdout(predicate::str::contains("failed to read workflow file"));
}

#[test]
fn check_without_workflows_fails() {
    let dir = TempDir::new().unwrap();
    wfcheck(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no workflow files found"));
}

#[test]
fn check_json_output() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["actions/checkout@v3"]));

    let output = wfcheck(&dir)
        .args(["--json", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["passed"], false);
    let issue = &value["files"][0]["issues"][0];
    assert_eq!(issue["kind"], "deprecated_version");
    assert_eq!(issue["suggested_fix"], "actions/checkout@v4");
    assert_eq!(issue["location"]["job"], "build");
    assert_eq!(issue["location"]["step"], 1);
}

// ---------------------------------------------------------------------------
// wfcheck diff / fix
// ---------------------------------------------------------------------------

#[test]
fn diff_prints_one_hunk_per_update() {
    let dir = TempDir::new().unwrap();
    write_workflow(
        &dir,
        "ci.yml",
        &workflow_with(&["actions/checkout@v3", "actions/upload-artifact@v3"]),
    );

    wfcheck(&dir)
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- a/.github/workflows/ci.yml"))
        .stdout(predicate::str::contains("+++ b/.github/workflows/ci.yml"))
        .stdout(predicate::str::contains("-        uses: actions/checkout@v3"))
        .stdout(predicate::str::contains("+        uses: actions/upload-artifact@v4"))
        .stdout(predicate::str::contains("@@ -9,1 +9,1 @@"));
}

#[test]
fn diff_with_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["actions/checkout@v4"]));
    wfcheck(&dir)
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No deprecated references to update."));
}

#[test]
fn fix_prints_batch_script() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["actions/checkout@v3"]));
    write_workflow(&dir, "deploy.yml", &workflow_with(&["actions/cache@v2"]));

    wfcheck(&dir)
        .arg("fix")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#!/bin/sh"))
        .stdout(predicate::str::contains("echo 'Updating .github/workflows/ci.yml...'"))
        .stdout(predicate::str::contains("s|actions/cache@v2$|actions/cache@v4|"))
        .stdout(predicate::str::contains("echo 'All fixes applied!'"));
}

#[test]
fn fix_writes_script_file() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["actions/checkout@v3"]));

    wfcheck(&dir)
        .args(["fix", "--output", "fix.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 update(s) across 1 file(s)"));

    let script = std::fs::read_to_string(dir.path().join("fix.sh")).unwrap();
    assert!(script.contains("actions/checkout@v4"));
}

// ---------------------------------------------------------------------------
// wfcheck classify
// ---------------------------------------------------------------------------

#[test]
fn classify_table() {
    let dir = TempDir::new().unwrap();
    wfcheck(&dir)
        .args(["classify", "actions/checkout@v4", "docker://alpine:3.18"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REFERENCE"))
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn classify_fails_on_blocking_verdict() {
    let dir = TempDir::new().unwrap();
    wfcheck(&dir)
        .args(["classify", "actions/checkout@v4", "actions/checkout@main"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid"))
        .stderr(predicate::str::contains("1 of 2 reference(s) failed"));
}

#[test]
fn classify_json() {
    let dir = TempDir::new().unwrap();
    let output = wfcheck(&dir)
        .args(["--json", "classify", "actions/checkout@v3"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["verdict"], "deprecated");
    assert_eq!(value[0]["suggested_version"], "v4");
    assert_eq!(value[0]["suggested_fix"], "actions/checkout@v4");
}

// ---------------------------------------------------------------------------
// wfcheck policy
// ---------------------------------------------------------------------------

#[test]
fn policy_init_then_show() {
    let dir = TempDir::new().unwrap();
    wfcheck(&dir)
        .args(["policy", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default policy"));
    assert!(dir.path().join(".github/wfcheck.yaml").exists());

    wfcheck(&dir)
        .args(["policy", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    wfcheck(&dir)
        .args(["policy", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("actions/checkout"))
        .stdout(predicate::str::contains("2023-09-01"));
}

#[test]
fn policy_validate_flags_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".github")).unwrap();
    std::fs::write(
        dir.path().join(".github/wfcheck.yaml"),
        "actions:\n  acme/tool: latest\n",
    )
    .unwrap();

    wfcheck(&dir)
        .args(["policy", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("policy validation found errors"));
}

#[test]
fn custom_policy_drives_check() {
    let dir = TempDir::new().unwrap();
    write_workflow(&dir, "ci.yml", &workflow_with(&["acme/tool@v1"]));
    std::fs::write(
        dir.path().join("policy.yaml"),
        "actions:\n  acme/tool: v2\ndeprecations:\n  v1: 2022-01-01\n",
    )
    .unwrap();

    wfcheck(&dir).arg("check").assert().success();
    wfcheck(&dir)
        .args(["--policy", "policy.yaml", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("acme/tool@v2"));
}

use assert_cmd::prelude::*;
#[allow(unused_imports)]
use predicates::prelude::*;

use std::process::Command;

#[test]
fn test_cli() {
    let mut cmd = Command::cargo_bin("abrsim").expect("Calling binary failed");
    cmd.assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "abrsim 0.1.0\n";
    let mut cmd = Command::cargo_bin("abrsim").expect("Calling binary failed");
    cmd.arg("--version")
        .assert()
        .stdout(expected_version);
}

#[test]
fn test_config_dump() {
    let mut cmd = Command::cargo_bin("abrsim").expect("Calling binary failed");
    cmd.arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ladder_kbps"));
}

#[test]
fn test_run_without_traces_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("abrsim").expect("Calling binary failed");
    // fresh cwd, so the default traces directory does not exist
    cmd.current_dir(dir.path())
        .arg("run")
        .assert()
        .failure();
}

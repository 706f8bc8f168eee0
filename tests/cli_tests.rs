//! Binary-level smoke tests for the CLI surface.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_pipeline() {
    Command::cargo_bin("passthesalt_release")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("libsodium"))
        .stdout(predicate::str::contains("--skip-deploy"));
}

#[test]
fn version_flag_prints_crate_version() {
    Command::cargo_bin("passthesalt_release")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn conflicting_verbosity_flags_are_rejected() {
    Command::cargo_bin("passthesalt_release")
        .unwrap()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure();
}

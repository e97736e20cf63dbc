use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn version_flag_reports_package_version() {
    Command::new(assert_cmd::cargo::cargo_bin!("msh"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_subcommands() {
    Command::new(assert_cmd::cargo::cargo_bin!("msh"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check-update"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn missing_config_is_reported() {
    let temp = tempdir().expect("failed to create tempdir");

    Command::new(assert_cmd::cargo::cargo_bin!("msh"))
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn invalid_log_level_is_rejected() {
    Command::new(assert_cmd::cargo::cargo_bin!("msh"))
        .arg("--log-level")
        .arg("loud")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log level"));
}

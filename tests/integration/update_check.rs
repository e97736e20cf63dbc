#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::write_config;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::tempdir;

fn endpoint_config(url: &str) -> String {
    format!(
        r#"version: "1"
server:
  command: "true"
update:
  endpoint: "{url}/latest-version.php"
"#
    )
}

fn check_update_against(body: &str) -> assert_cmd::assert::Assert {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/latest-version.php")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("v".into(), "1".into()),
            Matcher::UrlEncoded(
                "version".into(),
                format!("v{}", env!("CARGO_PKG_VERSION")),
            ),
        ]))
        .with_body(body)
        .create();

    let temp = tempdir().expect("failed to create tempdir");
    let config_path = write_config(temp.path(), &endpoint_config(&server.url()));

    Command::new(assert_cmd::cargo::cargo_bin!("msh"))
        .arg("check-update")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .assert()
}

#[test]
fn newer_release_is_announced() {
    check_update_against("latest version: v999.0.0")
        .success()
        .stdout(predicate::str::contains(
            "*** msh (v999.0.0) is now available: visit github to update! ***",
        ));
}

#[test]
fn current_release_is_confirmed() {
    let body = format!("latest version: v{}", env!("CARGO_PKG_VERSION"));
    check_update_against(&body)
        .success()
        .stdout(predicate::str::contains("is updated ***"));
}

#[test]
fn build_ahead_of_releases_is_unofficial() {
    check_update_against("latest version: v0.0.1")
        .success()
        .stdout(predicate::str::contains("is running an unofficial release"));
}

#[test]
fn unexpected_body_fails_the_check() {
    check_update_against("503 Service Unavailable")
        .failure()
        .stderr(predicate::str::contains("UnexpectedResponse"));
}

#[path = "common/mod.rs"]
mod common;

use std::{fs, time::Duration};

use common::{MshProcess, wait_for_path, write_config};
use nix::sys::signal::Signal;
use tempfile::tempdir;

/// Server stand-in: announces itself, then takes `shutdown_secs` to exit after `stop`.
fn console_config(shutdown_secs: u32) -> String {
    format!(
        r#"version: "1"
server:
  command: "echo started > started.marker; while read line; do if [ \"$line\" = stop ]; then sleep {shutdown_secs}; echo stopped > stopped.marker; exit 0; fi; done"
update:
  enabled: false
"#
    )
}

fn assert_clean_shutdown(sig: Signal) {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config_path = write_config(dir, &console_config(2));

    let msh = MshProcess::spawn(&config_path);
    wait_for_path(&dir.join("started.marker"));

    msh.signal(sig);
    let (status, stdout) = msh.wait_with_timeout(Duration::from_secs(15));

    assert!(status.success(), "msh exited with {status:?} on {sig}");
    assert!(
        stdout.contains("exiting msh"),
        "exit notice missing on {sig}. stdout:\n{stdout}"
    );
    // The server needs longer than the grace period to exit, so msh must have
    // waited for it rather than leaving right after the stop request.
    assert_eq!(
        fs::read_to_string(dir.join("stopped.marker"))
            .expect("server should have finished stopping before msh exited")
            .trim(),
        "stopped"
    );
}

#[test]
fn sigterm_waits_for_server_to_exit() {
    assert_clean_shutdown(Signal::SIGTERM);
}

#[test]
fn sigint_waits_for_server_to_exit() {
    assert_clean_shutdown(Signal::SIGINT);
}

#[test]
fn sighup_and_sigquit_are_termination_requests() {
    assert_clean_shutdown(Signal::SIGHUP);
    assert_clean_shutdown(Signal::SIGQUIT);
}

#[test]
fn exited_server_does_not_block_shutdown() {
    let temp = tempdir().expect("failed to create tempdir");
    let dir = temp.path();
    let config_path = write_config(
        dir,
        r#"version: "1"
server:
  command: "echo started > started.marker"
update:
  enabled: false
shutdown:
  grace: "200ms"
"#,
    );

    let msh = MshProcess::spawn(&config_path);
    wait_for_path(&dir.join("started.marker"));

    msh.signal(Signal::SIGTERM);
    let (status, stdout) = msh.wait_with_timeout(Duration::from_secs(10));

    assert!(status.success());
    assert!(stdout.contains("exiting msh"), "stdout:\n{stdout}");
}

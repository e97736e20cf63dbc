#![allow(dead_code)]

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};

/// Writes `msh.yaml` into `dir` and returns its path.
pub fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("msh.yaml");
    fs::write(&path, body).expect("failed to write config");
    path
}

pub fn wait_for_path(path: &Path) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if path.exists() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("Timed out waiting for {:?} to exist", path);
}

/// A running `msh` daemon with captured stdout.
pub struct MshProcess {
    child: Child,
}

impl MshProcess {
    pub fn spawn(config_path: &Path) -> Self {
        let child = Command::new(assert_cmd::cargo::cargo_bin!("msh"))
            .arg("--config")
            .arg(config_path)
            .arg("--log-level")
            .arg("debug")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn msh");
        Self { child }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn signal(&self, sig: Signal) {
        signal::kill(Pid::from_raw(self.child.id() as i32), sig)
            .expect("failed to signal msh");
    }

    /// Waits for msh to exit and returns its status and stdout.
    pub fn wait_with_timeout(mut self, timeout: Duration) -> (ExitStatus, String) {
        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = self.child.try_wait().expect("failed to poll msh") {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = self.child.kill();
                panic!("msh did not exit within {:?}", timeout);
            }
            thread::sleep(Duration::from_millis(50));
        };

        let mut stdout = String::new();
        if let Some(mut out) = self.child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        (status, stdout)
    }
}

impl Drop for MshProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

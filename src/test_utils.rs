use std::sync::{
    Arc, Condvar, Mutex, OnceLock,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crate::{
    error::ServerError,
    server::{ServerControl, ServerStatus},
};

/// Global lock for environment variable modifications in tests.
/// All tests that modify environment variables should acquire this lock
/// to prevent race conditions between parallel test executions.
pub static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory server controller recording every interaction.
pub struct FakeServer {
    status: Mutex<ServerStatus>,
    terminated: Condvar,
    terminal_active: AtomicBool,
    fail_stop: bool,
    pub stop_calls: Mutex<Vec<bool>>,
    pub wait_calls: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new(status: ServerStatus) -> Arc<Self> {
        Arc::new(Self::build(status, false))
    }

    /// A server whose stop operation always fails.
    pub fn failing_stop(status: ServerStatus) -> Arc<Self> {
        Arc::new(Self::build(status, true))
    }

    fn build(status: ServerStatus, fail_stop: bool) -> Self {
        Self {
            status: Mutex::new(status),
            terminated: Condvar::new(),
            terminal_active: AtomicBool::new(true),
            fail_stop,
            stop_calls: Mutex::new(Vec::new()),
            wait_calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, status: ServerStatus) {
        *self.status.lock().unwrap() = status;
        self.terminated.notify_all();
    }

    pub fn set_terminal_active(&self, active: bool) {
        self.terminal_active.store(active, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl ServerControl for FakeServer {
    fn status(&self) -> ServerStatus {
        *self.status.lock().unwrap()
    }

    fn stop(&self, check_players: bool) -> Result<(), ServerError> {
        self.stop_calls.lock().unwrap().push(check_players);
        if self.fail_stop {
            return Err(ServerError::NotRunning(self.status()));
        }
        Ok(())
    }

    fn wait_terminated(&self) {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        let mut status = self.status.lock().unwrap();
        while *status != ServerStatus::Offline {
            status = self.terminated.wait(status).unwrap();
        }
    }

    fn execute(&self, command: &str, _origin: &str) -> Result<(), ServerError> {
        if !self.is_terminal_active() {
            return Err(ServerError::TerminalInactive);
        }
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }

    fn is_terminal_active(&self) -> bool {
        self.terminal_active.load(Ordering::SeqCst)
    }
}

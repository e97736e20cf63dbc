//! Signal-driven forced shutdown.
//!
//! On SIGHUP, SIGINT, SIGTERM or SIGQUIT the coordinator force-stops the
//! server, waits for its process to go away, cancels the background threads
//! and exits msh with status 0.
use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info, warn};

use crate::{
    clock::CancellationToken,
    error::ShutdownError,
    server::{ServerControl, ServerStatus},
};

/// Termination requests handled by the coordinator.
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGHUP, SIGINT, SIGTERM, SIGQUIT];

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Shutdown listener backed by OS termination signals.
///
/// Handlers are installed on construction, so signals arriving before the
/// coordinator starts waiting are not lost.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new(TERMINATION_SIGNALS).map_err(ShutdownError::Install)?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = self.signals.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(signal) = signals.forever().next() {
            info!(signal, "Shutdown signal received");
        }
        Ok(())
    }
}

/// How the server was found once the stop request had time to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The server was stopping and its process has now exited.
    Terminated,
    /// The server was already offline.
    AlreadyOffline,
    /// The server was in neither state; shutdown went ahead regardless.
    Unexpected(ServerStatus),
}

/// Drives the forced shutdown sequence.
pub struct ShutdownCoordinator<S: ServerControl + ?Sized> {
    server: Arc<S>,
    cancel: CancellationToken,
    grace: Duration,
}

impl<S: ServerControl + ?Sized + 'static> ShutdownCoordinator<S> {
    pub fn new(server: Arc<S>, cancel: CancellationToken, grace: Duration) -> Self {
        Self {
            server,
            cancel,
            grace,
        }
    }

    /// Force-stops the server and waits until it is safe to exit.
    ///
    /// A failing stop request is logged and does not abort the sequence.
    pub fn stop_server(&self) -> StopOutcome {
        if let Err(err) = self.server.stop(false) {
            error!("Failed to stop server during shutdown: {err}");
        }

        thread::sleep(self.grace);

        match self.server.status() {
            ServerStatus::Stopping => {
                info!("Waiting for server process to exit (server is stopping)");
                self.server.wait_terminated();
                StopOutcome::Terminated
            }
            ServerStatus::Offline => {
                info!("Server process already exited (server is offline)");
                StopOutcome::AlreadyOffline
            }
            status => {
                warn!(
                    "Stop command does not seem to be stopping the server during forced shutdown (status: {status})"
                );
                StopOutcome::Unexpected(status)
            }
        }
    }

    /// Waits for one shutdown request, stops the server and cancels the
    /// background threads.
    pub fn shutdown_on(&self, signal: &dyn ShutdownSignal) -> Result<StopOutcome, ShutdownError> {
        signal.wait()?;
        let outcome = self.stop_server();
        self.cancel.cancel();
        Ok(outcome)
    }

    /// Handles the first shutdown request and exits the process.
    pub fn run(&self, signal: &dyn ShutdownSignal) -> Result<Infallible, ShutdownError> {
        self.shutdown_on(signal)?;
        println!("exiting msh");
        std::process::exit(0);
    }
}

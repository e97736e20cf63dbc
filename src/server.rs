//! Control surface of the server process msh fronts.
//!
//! The lifecycle threads only ever talk to the server through
//! [`ServerControl`]. [`ChildServer`] is the implementation the daemon runs
//! with: it launches the configured command, uses its stdin as the console
//! and tracks the coarse lifecycle status.
use std::{
    io::{BufRead, BufReader, Read, Write},
    os::unix::process::CommandExt,
    path::PathBuf,
    process::{ChildStdin, Command, Stdio},
    sync::{Arc, Condvar, Mutex},
    thread,
};

use strum::{Display, EnumString};
use tracing::{debug, error, info, warn};

use crate::{config::ServerConfig, error::ServerError};

/// Coarse lifecycle state of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ServerStatus {
    Offline,
    Starting,
    Online,
    Stopping,
}

/// Operations the lifecycle threads need from the server controller.
///
/// Implementations are shared between threads and serialize access to the
/// server themselves.
pub trait ServerControl: Send + Sync {
    /// Current status, read under the controller's own synchronization.
    fn status(&self) -> ServerStatus;

    /// Asks the server to stop. With `check_players` unset the stop is forced.
    fn stop(&self, check_players: bool) -> Result<(), ServerError>;

    /// Blocks until the server process has exited. Returns immediately when it
    /// is not running.
    fn wait_terminated(&self);

    /// Sends a console command to the server. `origin` names the caller for logging.
    fn execute(&self, command: &str, origin: &str) -> Result<(), ServerError>;

    /// Whether the console currently accepts commands.
    fn is_terminal_active(&self) -> bool;
}

#[derive(Debug)]
struct Terminal {
    status: ServerStatus,
    stdin: Option<ChildStdin>,
    pid: Option<u32>,
}

#[derive(Debug)]
struct Shared {
    terminal: Mutex<Terminal>,
    exited: Condvar,
}

impl Shared {
    fn set_status(&self, status: ServerStatus) {
        let mut terminal = self.terminal.lock().unwrap_or_else(|p| p.into_inner());
        debug!("Server status: {} -> {}", terminal.status, status);
        terminal.status = status;
    }

    fn mark_online(&self) {
        let mut terminal = self.terminal.lock().unwrap_or_else(|p| p.into_inner());
        if terminal.status == ServerStatus::Starting {
            info!("Server is online");
            terminal.status = ServerStatus::Online;
        }
    }

    fn mark_exited(&self) {
        let mut terminal = self.terminal.lock().unwrap_or_else(|p| p.into_inner());
        terminal.status = ServerStatus::Offline;
        terminal.stdin = None;
        terminal.pid = None;
        self.exited.notify_all();
    }
}

/// Server launched as a child process whose stdin is the console.
#[derive(Debug, Clone)]
pub struct ChildServer {
    config: ServerConfig,
    working_dir: PathBuf,
    shared: Arc<Shared>,
}

impl ChildServer {
    pub fn new(config: ServerConfig, working_dir: PathBuf) -> Self {
        Self {
            config,
            working_dir,
            shared: Arc::new(Shared {
                terminal: Mutex::new(Terminal {
                    status: ServerStatus::Offline,
                    stdin: None,
                    pid: None,
                }),
                exited: Condvar::new(),
            }),
        }
    }

    /// PID of the running server, if any.
    pub fn pid(&self) -> Option<u32> {
        self.shared.terminal.lock().ok().and_then(|t| t.pid)
    }

    /// Launches the server process. A server that is already running is left alone.
    pub fn start(&self) -> Result<(), ServerError> {
        let mut terminal = self.shared.terminal.lock()?;
        if terminal.status != ServerStatus::Offline {
            debug!("Server already {}; start ignored", terminal.status);
            return Ok(());
        }

        let command = &self.config.command;
        debug!("Launching server with command: `{command}`");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd.current_dir(&self.working_dir);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        unsafe {
            cmd.pre_exec(|| {
                // Own process group, so terminal signals aimed at msh do not
                // reach the server before it has been stopped cleanly.
                if libc::setpgid(0, 0) < 0 {
                    return Err(std::io::Error::last_os_error());
                }

                #[cfg(target_os = "linux")]
                {
                    use libc::{PR_SET_PDEATHSIG, SIGTERM, prctl};
                    if prctl(PR_SET_PDEATHSIG, SIGTERM, 0, 0, 0) < 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }

                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| {
            error!("Failed to start server `{command}`: {source}");
            ServerError::Spawn {
                command: command.clone(),
                source,
            }
        })?;

        let pid = child.id();
        info!("Server started with PID: {pid}");

        terminal.stdin = child.stdin.take();
        terminal.pid = Some(pid);
        terminal.status = if self.config.ready_pattern.is_some() {
            ServerStatus::Starting
        } else {
            ServerStatus::Online
        };
        drop(terminal);

        if let Some(out) = child.stdout.take() {
            self.spawn_output_forwarder(out, false);
        }
        if let Some(err) = child.stderr.take() {
            self.spawn_output_forwarder(err, true);
        }

        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            match child.wait() {
                Ok(status) => info!("Server process {pid} exited with {status}"),
                Err(err) => error!("Failed to wait for server process {pid}: {err}"),
            }
            shared.mark_exited();
        });

        Ok(())
    }

    fn spawn_output_forwarder<R: Read + Send + 'static>(&self, stream: R, stderr: bool) {
        let shared = Arc::clone(&self.shared);
        let ready_pattern = self.config.ready_pattern.clone();
        thread::spawn(move || {
            for line in BufReader::new(stream).lines().map_while(Result::ok) {
                if stderr {
                    warn!(target: "msh::server", "{line}");
                } else {
                    info!(target: "msh::server", "{line}");
                }

                if let Some(pattern) = ready_pattern.as_deref()
                    && line.contains(pattern)
                {
                    shared.mark_online();
                }
            }
        });
    }

    fn write_line(&self, command: &str) -> Result<(), ServerError> {
        let mut terminal = self.shared.terminal.lock()?;
        let stdin = terminal
            .stdin
            .as_mut()
            .ok_or(ServerError::TerminalInactive)?;

        writeln!(stdin, "{command}")
            .and_then(|_| stdin.flush())
            .map_err(|source| ServerError::Write {
                command: command.to_string(),
                source,
            })
    }
}

impl ServerControl for ChildServer {
    fn status(&self) -> ServerStatus {
        self.shared
            .terminal
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .status
    }

    fn stop(&self, check_players: bool) -> Result<(), ServerError> {
        let status = self.status();
        if !matches!(status, ServerStatus::Starting | ServerStatus::Online) {
            return Err(ServerError::NotRunning(status));
        }

        if check_players {
            // Player accounting lives outside this controller.
            debug!("Player check requested but not available; stopping server");
        }

        info!("Stopping server");
        self.write_line(self.config.stop_command())?;
        self.shared.set_status(ServerStatus::Stopping);
        Ok(())
    }

    fn wait_terminated(&self) {
        let mut terminal = self
            .shared
            .terminal
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        while terminal.pid.is_some() {
            terminal = self
                .shared
                .exited
                .wait(terminal)
                .unwrap_or_else(|p| p.into_inner());
        }
    }

    fn execute(&self, command: &str, origin: &str) -> Result<(), ServerError> {
        debug!("{origin}: sending `{command}` to server terminal");
        self.write_line(command)
    }

    fn is_terminal_active(&self) -> bool {
        self.shared
            .terminal
            .lock()
            .map(|terminal| terminal.stdin.is_some())
            .unwrap_or(false)
    }
}

//! Repeating in-game chat notifications.
use std::{sync::Arc, thread, time::Duration};

use tracing::{debug, error};

use crate::{
    clock::{CancellationToken, Clock},
    constants::SAY_COMMAND,
    server::ServerControl,
};

/// Broadcasts a chat message at a fixed cadence until a deadline passes.
pub struct Broadcaster<S: ServerControl + ?Sized> {
    server: Arc<S>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    interval: Duration,
    duration: Duration,
    message: String,
}

impl<S: ServerControl + ?Sized + 'static> Broadcaster<S> {
    pub fn new(
        server: Arc<S>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
        interval: Duration,
        duration: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            server,
            clock,
            cancel,
            interval,
            duration,
            message: message.into(),
        }
    }

    /// Runs the broadcast on its own thread. Nothing waits for it: it ends at
    /// its deadline or when the token is cancelled.
    pub fn spawn(self) -> thread::JoinHandle<usize> {
        thread::spawn(move || self.run())
    }

    /// Runs the broadcast on the calling thread and returns how many messages
    /// were handed to the server.
    pub fn run(&self) -> usize {
        let deadline = self.clock.now() + self.duration;
        let command = format!("{SAY_COMMAND} {}", self.message);
        let mut sent = 0;

        while self.clock.now() < deadline {
            if self.server.is_terminal_active() {
                match self.server.execute(&command, "notify") {
                    Ok(()) => sent += 1,
                    Err(err) => error!("Failed to broadcast update notice: {err}"),
                }
            } else {
                debug!("Server terminal inactive; skipping update notice");
            }

            if self.clock.sleep(self.interval, &self.cancel) {
                debug!("Update notice broadcast cancelled");
                break;
            }
        }

        sent
    }
}

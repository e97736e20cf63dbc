//! Periodic self-update checking.
//!
//! The [`UpdateManager`] wakes up every check interval, asks the release
//! endpoint for the latest version, tells the user what it found and starts an
//! in-game [`Broadcaster`] when an update is available.
use std::{
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, SyncSender, TrySendError},
    },
    thread,
    time::Duration,
};

use tracing::{debug, error, info};

use crate::{
    clock::{CancellationToken, Clock},
    config::NotificationGate,
    constants::{UPDATE_PROTOCOL_VERSION, UPDATE_RESPONSE_HEADER},
    notify::Broadcaster,
    server::ServerControl,
    update::{UpdateCheck, UpdateClient, UpdateStatus},
};

/// Creates the "a check completed" signal pair.
///
/// The slot holds at most one pending token and the sender never blocks, so a
/// slow or absent observer cannot stall the poller.
pub fn checked_signal() -> (CheckedNotifier, CheckedReceiver) {
    let (tx, rx) = mpsc::sync_channel(1);
    (CheckedNotifier { tx }, CheckedReceiver { rx: Mutex::new(rx) })
}

/// Producer half of the check-completed signal.
#[derive(Debug, Clone)]
pub struct CheckedNotifier {
    tx: SyncSender<()>,
}

impl CheckedNotifier {
    /// Publishes a token unless one is already pending. Returns whether a
    /// token was queued.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Disconnected(())) => {
                debug!("No observer for completed update checks");
                false
            }
        }
    }
}

/// Observer half of the check-completed signal.
#[derive(Debug)]
pub struct CheckedReceiver {
    rx: Mutex<Receiver<()>>,
}

impl CheckedReceiver {
    /// Consumes the pending token, if any, without blocking.
    pub fn try_recv(&self) -> bool {
        let rx = self.rx.lock().unwrap_or_else(|p| p.into_inner());
        rx.try_recv().is_ok()
    }

    /// Waits up to `timeout` for a check to complete.
    pub fn recv_timeout(&self, timeout: Duration) -> bool {
        let rx = self.rx.lock().unwrap_or_else(|p| p.into_inner());
        rx.recv_timeout(timeout).is_ok()
    }
}

/// Cadences used by the update manager.
#[derive(Debug, Clone, Copy)]
pub struct UpdateSchedule {
    /// Time between two version checks.
    pub check_interval: Duration,
    /// Time between two in-game notices while an update is pending.
    pub notify_interval: Duration,
}

/// Line printed to the console for a check outcome, if the outcome warrants one.
pub fn console_notice(check: &UpdateCheck, client_version: &str) -> Option<String> {
    match check.status {
        UpdateStatus::Updated => Some(format!("*** msh ({client_version}) is updated ***")),
        UpdateStatus::UpdateAvailable => Some(update_available_notice(&check.online_version)),
        UpdateStatus::UnofficialVersion => Some(format!(
            "*** msh ({client_version}) is running an unofficial release ***"
        )),
        UpdateStatus::Error => None,
    }
}

fn update_available_notice(online_version: &str) -> String {
    format!("*** msh ({online_version}) is now available: visit github to update! ***")
}

/// Background poller for new releases.
pub struct UpdateManager<S: ServerControl + ?Sized> {
    client: UpdateClient,
    client_version: String,
    server: Arc<S>,
    gate: NotificationGate,
    checked: CheckedNotifier,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    schedule: UpdateSchedule,
}

impl<S: ServerControl + ?Sized + 'static> UpdateManager<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: UpdateClient,
        client_version: impl Into<String>,
        server: Arc<S>,
        gate: NotificationGate,
        checked: CheckedNotifier,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
        schedule: UpdateSchedule,
    ) -> Self {
        Self {
            client,
            client_version: client_version.into(),
            server,
            gate,
            checked,
            clock,
            cancel,
            schedule,
        }
    }

    /// Runs the poller on its own thread.
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    /// Polls until the cancellation token fires.
    pub fn run(&self) {
        loop {
            self.poll_once();

            if self.clock.sleep(self.schedule.check_interval, &self.cancel) {
                debug!("Update manager stopping");
                return;
            }
        }
    }

    /// Runs one check-notify cycle and returns its outcome.
    pub fn poll_once(&self) -> UpdateCheck {
        info!("Checking version...");

        let result = self.client.check_update(
            UPDATE_PROTOCOL_VERSION,
            &self.client_version,
            UPDATE_RESPONSE_HEADER,
        );
        if let Err(err) = &result {
            error!("Update check failed: {err}");
        }
        let check = UpdateCheck::from(&result);

        if self.gate.is_enabled() {
            self.notify(&check);
        }

        self.checked.notify();
        check
    }

    fn notify(&self, check: &UpdateCheck) {
        let Some(notice) = console_notice(check, &self.client_version) else {
            return;
        };
        println!("{notice}");

        if check.status == UpdateStatus::UpdateAvailable {
            Broadcaster::new(
                Arc::clone(&self.server),
                Arc::clone(&self.clock),
                self.cancel.clone(),
                self.schedule.notify_interval,
                self.schedule.check_interval,
                notice,
            )
            .spawn();
        }
    }
}

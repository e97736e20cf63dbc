//! msh fronts a long-running server process. This crate holds its lifecycle
//! core: a signal-driven shutdown that waits for the server to exit before msh
//! does, and a periodic self-update check that notifies the operator and the
//! players in game when a new release is out.

/// CLI interface.
pub mod cli;

/// Time source and cancellation for background threads.
pub mod clock;

/// Configuration management.
pub mod config;

/// Protocol constants and default cadences.
pub mod constants;

/// Error handling.
pub mod error;

/// Periodic update poller.
pub mod manager;

/// In-game notification broadcaster.
pub mod notify;

/// Server process controller.
pub mod server;

/// Forced shutdown on termination signals.
pub mod shutdown;

/// Version-check protocol.
pub mod update;

/// Dotted version parsing and comparison.
pub mod version;

#[cfg(test)]
mod test_utils;

/// Version string this build reports to the release endpoint, e.g. `v2.5.0`.
pub fn client_version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

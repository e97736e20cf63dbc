//! Time source and cancellation shared by the background threads.
//!
//! Every sleep in the poller and the broadcaster goes through a [`Clock`] so
//! the shutdown path can interrupt it, and so tests can drive time by hand.
use std::{
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

/// Cooperative cancellation flag that can wake sleeping threads.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token cancelled and wakes every waiter.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(|p| p.into_inner());
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Blocks for `duration` or until cancelled. Returns `true` when cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|p| p.into_inner());
        let (cancelled, _) = cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(|p| p.into_inner());
        *cancelled
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Source of time for the background threads.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Sleeps for `duration` unless `cancel` fires first. Returns `true` when
    /// the sleep was cut short by cancellation.
    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool;
}

/// Wall-clock implementation backed by [`Instant`] and condvar waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        cancel.wait_timeout(duration)
    }
}

/// Clock that only advances when something sleeps on it.
///
/// Sleeping returns immediately after moving the clock forward, which makes
/// multi-hour schedules testable in microseconds.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Total time slept on this clock so far.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|p| p.into_inner());
        *elapsed += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return true;
        }
        self.advance(duration);
        cancel.is_cancelled()
    }
}

//! Stall detection for long polls.
//!
//! The engine bumps a [`Heartbeat`] on every state transition while a poll
//! is in flight. A [`Watchdog`] thread trips a [`CancellationToken`] when the
//! heartbeat goes quiet for longer than its timeout. It only interrupts; it
//! never touches buffers or checkpoints.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates an untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the token was tripped.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the token so polling can resume.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Pulse {
    epoch: Instant,
    last_millis: AtomicU64,
    busy: AtomicBool,
}

/// Liveness signal shared between the engine and a watchdog.
#[derive(Debug, Clone)]
pub struct Heartbeat(Arc<Pulse>);

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    /// Creates an idle heartbeat.
    pub fn new() -> Self {
        Self(Arc::new(Pulse {
            epoch: Instant::now(),
            last_millis: AtomicU64::new(0),
            busy: AtomicBool::new(false),
        }))
    }

    /// Records progress.
    pub fn beat(&self) {
        let now = self.0.epoch.elapsed().as_millis() as u64;
        self.0.last_millis.store(now, Ordering::SeqCst);
    }

    /// Marks a poll as started.
    pub fn enter(&self) {
        self.beat();
        self.0.busy.store(true, Ordering::SeqCst);
    }

    /// Marks the poll as finished; an idle engine is never stalled.
    pub fn leave(&self) {
        self.0.busy.store(false, Ordering::SeqCst);
    }

    /// Time since the last beat, or `None` while idle.
    pub fn stalled_for(&self) -> Option<Duration> {
        if !self.0.busy.load(Ordering::SeqCst) {
            return None;
        }
        let now = self.0.epoch.elapsed().as_millis() as u64;
        let last = self.0.last_millis.load(Ordering::SeqCst);
        Some(Duration::from_millis(now.saturating_sub(last)))
    }
}

/// Background thread that trips a token when the heartbeat stalls.
///
/// Stopped and joined on drop.
#[derive(Debug)]
pub struct Watchdog {
    token: CancellationToken,
    heartbeat: Heartbeat,
    stop: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
}

impl Watchdog {
    /// Spawns a watchdog with its own token and heartbeat.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from spawning the thread.
    pub fn spawn(timeout: Duration) -> io::Result<Self> {
        let token = CancellationToken::new();
        let heartbeat = Heartbeat::new();
        let stop = Arc::new(AtomicBool::new(false));
        let poll_interval = (timeout / 4).clamp(Duration::from_millis(1), Duration::from_millis(250));

        let thread_stop = stop.clone();
        let thread_token = token.clone();
        let thread_heartbeat = heartbeat.clone();
        let join = thread::Builder::new()
            .name("ibmi-cdc-watchdog".to_string())
            .spawn(move || {
                while !thread_stop.load(Ordering::Relaxed) {
                    if let Some(stalled) = thread_heartbeat.stalled_for() {
                        if stalled > timeout && !thread_token.is_cancelled() {
                            warn!(
                                stalled_ms = stalled.as_millis() as u64,
                                timeout_ms = timeout.as_millis() as u64,
                                "retrieval stalled; cancelling poll"
                            );
                            thread_token.cancel();
                        }
                    }
                    thread::sleep(poll_interval);
                }
            })?;

        Ok(Self {
            token,
            heartbeat,
            stop,
            join: Some(join),
        })
    }

    /// The token this watchdog trips.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The heartbeat this watchdog observes.
    pub fn heartbeat(&self) -> Heartbeat {
        self.heartbeat.clone()
    }

    /// Stops the thread and waits for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! Debounced, best-effort mirroring of the local snapshot to a cloud backend.
//!
//! Writes never wait on the network. [`SyncHandle::schedule`] hands the latest
//! snapshot to a worker thread that keeps a single [`PendingSync`] slot and uploads
//! once no newer snapshot has arrived for the debounce delay.

use std::{
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use motoreal_domain::Snapshot;

use crate::CoreError;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);

/// Remote blob store holding one full snapshot.
pub trait CloudBackend: Send + Sync {
    fn name(&self) -> &str;
    fn upload(&self, snapshot: &Snapshot) -> Result<(), CoreError>;
    /// Returns `None` when nothing has been uploaded yet.
    fn download(&self) -> Result<Option<Snapshot>, CoreError>;
}

/// Single-slot debounce state. Time is always supplied by the caller.
#[derive(Debug)]
pub struct PendingSync {
    delay: Duration,
    slot: Option<(Snapshot, Instant)>,
}

impl PendingSync {
    pub fn new(delay: Duration) -> Self {
        Self { delay, slot: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending snapshot and pushes the deadline out to `now + delay`.
    pub fn schedule(&mut self, snapshot: Snapshot, now: Instant) {
        self.slot = Some((snapshot, now + self.delay));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Takes the pending snapshot if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Snapshot> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.take(),
            _ => None,
        }
    }

    /// Takes the pending snapshot regardless of its deadline.
    pub fn take(&mut self) -> Option<Snapshot> {
        self.slot.take().map(|(snapshot, _)| snapshot)
    }

    pub fn cancel(&mut self) {
        self.slot = None;
    }
}

/// Counters describing the worker's upload history.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub uploads: u64,
    pub failures: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

enum SyncMessage {
    Schedule(Snapshot),
    Flush(mpsc::Sender<()>),
    Cancel,
    Shutdown,
}

/// Owner of the background sync worker.
///
/// Dropping the handle flushes whatever is pending and joins the worker.
pub struct SyncHandle {
    backend: Arc<dyn CloudBackend>,
    sender: mpsc::Sender<SyncMessage>,
    stats: Arc<Mutex<SyncStats>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn spawn(backend: Arc<dyn CloudBackend>, delay: Duration) -> Result<Self, CoreError> {
        let (sender, receiver) = mpsc::channel();
        let stats = Arc::new(Mutex::new(SyncStats::default()));
        let worker_backend = Arc::clone(&backend);
        let worker_stats = Arc::clone(&stats);
        let worker = thread::Builder::new()
            .name("driver-ledger-sync".into())
            .spawn(move || {
                run_worker(
                    worker_backend.as_ref(),
                    receiver,
                    PendingSync::new(delay),
                    &worker_stats,
                )
            })?;
        tracing::info!(
            backend = backend.name(),
            delay_ms = delay.as_millis() as u64,
            "cloud sync enabled"
        );
        Ok(Self {
            backend,
            sender,
            stats,
            worker: Some(worker),
        })
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn schedule(&self, snapshot: Snapshot) {
        if self.sender.send(SyncMessage::Schedule(snapshot)).is_err() {
            tracing::warn!("sync worker is gone; change will not be mirrored");
        }
    }

    /// Uploads the pending snapshot now and waits for the attempt to finish.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        if self.sender.send(SyncMessage::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(SyncMessage::Cancel);
    }

    /// Uploads `snapshot` synchronously, bypassing the debounce.
    pub fn push_now(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        self.cancel();
        let result = self.backend.upload(snapshot);
        record(&self.stats, &result);
        result
    }

    pub fn download(&self) -> Result<Option<Snapshot>, CoreError> {
        self.backend.download()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.sender.send(SyncMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("sync worker panicked during shutdown");
            }
        }
    }
}

fn run_worker(
    backend: &dyn CloudBackend,
    receiver: mpsc::Receiver<SyncMessage>,
    mut pending: PendingSync,
    stats: &Mutex<SyncStats>,
) {
    loop {
        let message = match pending.deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(wait) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => Some(SyncMessage::Shutdown),
                }
            }
            None => Some(receiver.recv().unwrap_or(SyncMessage::Shutdown)),
        };

        match message {
            Some(SyncMessage::Schedule(snapshot)) => {
                pending.schedule(snapshot, Instant::now());
                tracing::debug!("cloud sync scheduled");
            }
            Some(SyncMessage::Flush(ack)) => {
                if let Some(snapshot) = pending.take() {
                    upload(backend, &snapshot, stats);
                }
                let _ = ack.send(());
            }
            Some(SyncMessage::Cancel) => pending.cancel(),
            Some(SyncMessage::Shutdown) => {
                if let Some(snapshot) = pending.take() {
                    upload(backend, &snapshot, stats);
                }
                break;
            }
            None => {
                if let Some(snapshot) = pending.take_due(Instant::now()) {
                    upload(backend, &snapshot, stats);
                }
            }
        }
    }
}

fn upload(backend: &dyn CloudBackend, snapshot: &Snapshot, stats: &Mutex<SyncStats>) {
    let result = backend.upload(snapshot);
    match &result {
        Ok(()) => tracing::info!(backend = backend.name(), "snapshot mirrored to cloud"),
        Err(err) => tracing::warn!(backend = backend.name(), error = %err, "cloud sync failed"),
    }
    record(stats, &result);
}

fn record(stats: &Mutex<SyncStats>, result: &Result<(), CoreError>) {
    if let Ok(mut stats) = stats.lock() {
        match result {
            Ok(()) => {
                stats.uploads += 1;
                stats.last_success = Some(Utc::now());
                stats.last_error = None;
            }
            Err(err) => {
                stats.failures += 1;
                stats.last_error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_sync_keeps_only_latest_snapshot() {
        let start = Instant::now();
        let mut pending = PendingSync::new(Duration::from_secs(5));
        let first = Snapshot::seeded();
        let mut second = Snapshot::seeded();
        second.accounts.clear();

        pending.schedule(first, start);
        pending.schedule(second, start + Duration::from_secs(3));

        assert!(pending.take_due(start + Duration::from_secs(6)).is_none());
        let due = pending
            .take_due(start + Duration::from_secs(8))
            .expect("deadline passed");
        assert!(due.accounts.is_empty());
        assert!(!pending.is_pending());
    }

    #[test]
    fn cancel_clears_the_slot() {
        let now = Instant::now();
        let mut pending = PendingSync::new(Duration::from_secs(1));
        pending.schedule(Snapshot::seeded(), now);
        pending.cancel();
        assert!(pending.take_due(now + Duration::from_secs(10)).is_none());
    }
}

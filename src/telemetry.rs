//! Telemetry retry queue — best-effort delivery of usage/access events.
//!
//! Events that fail with a plausibly transient error are persisted in a
//! bounded queue and replayed by [`TelemetryRetryQueue::flush`]. Events that
//! fail permanently are dropped. Callers never see an error.

use std::collections::VecDeque;
use std::sync::Arc;

use async_lock::Mutex;
use serde_json::Value;

use crate::error::{ErrorKind, StorageError};
use crate::http::{ApiHttp, RequestOptions};
use crate::storage::{self, KeyValueStore};

/// Default storage key for the persisted queue.
pub const TELEMETRY_QUEUE_KEY: &str = "telemetry_queue";

/// Default bound on persisted events.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Endpoint, storage key, and bound for the queue.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub endpoint: String,
    pub storage_key: String,
    pub capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/logs".to_string(),
            storage_key: TELEMETRY_QUEUE_KEY.to_string(),
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Result of [`TelemetryRetryQueue::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered,
    /// Persisted for a later flush; `evicted` is set when the oldest entry
    /// was dropped to make room.
    Queued { evicted: bool },
    /// Permanent failure, or the queue could not be written.
    Dropped(ErrorKind),
}

/// Result of [`TelemetryRetryQueue::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    /// Failed again and still queued after the pass.
    pub retained: usize,
}

/// Durable, bounded retry queue. Clones share the same lock and store.
#[derive(Clone)]
pub struct TelemetryRetryQueue {
    inner: Arc<Inner>,
}

struct Inner {
    http: ApiHttp,
    store: Arc<dyn KeyValueStore>,
    config: TelemetryConfig,
    /// Serializes every read-modify-write of the persisted queue.
    lock: Mutex<()>,
}

impl TelemetryRetryQueue {
    pub fn new(http: ApiHttp, store: Arc<dyn KeyValueStore>, config: TelemetryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                store,
                config,
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.inner.config
    }

    /// Try to deliver `event` now; queue it if the failure is transient.
    pub async fn submit(&self, event: Value) -> SubmitOutcome {
        let error = match self.deliver(&event).await {
            Ok(()) => return SubmitOutcome::Delivered,
            Err(error) => error,
        };

        if !error.is_queueable() {
            tracing::debug!(kind = %error, "Dropping telemetry event with permanent failure");
            return SubmitOutcome::Dropped(error);
        }

        let _guard = self.inner.lock.lock().await;
        match self.enqueue(event) {
            Ok(evicted) => SubmitOutcome::Queued { evicted },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist telemetry event");
                SubmitOutcome::Dropped(error)
            }
        }
    }

    /// Submit on the current runtime without waiting.
    pub fn spawn_submit(&self, event: Value) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                runtime.spawn(async move {
                    queue.submit(event).await;
                });
            }
            Err(_) => tracing::warn!("No async runtime available, dropping telemetry event"),
        }
    }

    /// Replay every queued event in order and keep only the ones that failed,
    /// in their original relative order.
    pub async fn flush(&self) -> FlushReport {
        let _guard = self.inner.lock.lock().await;

        let queued = match self.load() {
            Ok(queued) => queued,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable telemetry queue");
                self.remove_key();
                return FlushReport::default();
            }
        };
        if queued.is_empty() {
            self.remove_key();
            return FlushReport::default();
        }

        let mut report = FlushReport::default();
        let mut survivors = VecDeque::new();
        for event in queued {
            match self.deliver(&event).await {
                Ok(()) => report.delivered += 1,
                Err(kind) => {
                    tracing::debug!(kind = %kind, "Telemetry event still failing, keeping it");
                    survivors.push_back(event);
                }
            }
        }
        report.retained = survivors.len();

        let written = if survivors.is_empty() {
            self.inner.store.remove(&self.inner.config.storage_key)
        } else {
            self.save(&survivors)
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "Failed to rewrite telemetry queue");
        }

        tracing::debug!(
            delivered = report.delivered,
            retained = report.retained,
            "Flushed telemetry queue"
        );
        report
    }

    /// The events currently persisted, oldest first.
    pub fn pending(&self) -> Vec<Value> {
        self.load().map(Vec::from).unwrap_or_default()
    }

    // ── Internal ─────────────────────────────────────────────────────────

    async fn deliver(&self, event: &Value) -> Result<(), ErrorKind> {
        self.inner
            .http
            .post(&self.inner.config.endpoint, event, &RequestOptions::quiet())
            .await
            .map(|_| ())
            .map_err(|e| e.kind())
    }

    /// Append under the queue lock. Returns whether an entry was evicted.
    fn enqueue(&self, event: Value) -> Result<bool, StorageError> {
        let mut queued = match self.load() {
            Ok(queued) => queued,
            Err(e) => {
                tracing::warn!(error = %e, "Replacing unreadable telemetry queue");
                VecDeque::new()
            }
        };
        let evicted = push_bounded(&mut queued, event, self.inner.config.capacity);
        self.save(&queued)?;
        Ok(evicted)
    }

    fn load(&self) -> Result<VecDeque<Value>, StorageError> {
        storage::load_json::<VecDeque<Value>>(
            self.inner.store.as_ref(),
            &self.inner.config.storage_key,
        )
        .map(Option::unwrap_or_default)
    }

    fn save(&self, queued: &VecDeque<Value>) -> Result<(), StorageError> {
        storage::save_json(
            self.inner.store.as_ref(),
            &self.inner.config.storage_key,
            queued,
        )
    }

    fn remove_key(&self) {
        if let Err(e) = self.inner.store.remove(&self.inner.config.storage_key) {
            tracing::warn!(error = %e, "Failed to delete telemetry queue");
        }
    }
}

/// Append at the tail, evicting from the head while over `capacity`.
/// Returns whether anything was evicted.
fn push_bounded(queue: &mut VecDeque<Value>, event: Value, capacity: usize) -> bool {
    let mut evicted = false;
    while !queue.is_empty() && queue.len() >= capacity.max(1) {
        queue.pop_front();
        evicted = true;
    }
    queue.push_back(event);
    evicted
}

//! Single-flight gate for session refresh.

use std::sync::atomic::{AtomicU64, Ordering};

use async_lock::Mutex;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::error::ApiError;

type Flight = Shared<BoxFuture<'static, Result<(), ApiError>>>;

/// Holds at most one in-flight refresh.
///
/// Callers that arrive while a refresh is running await the same shared
/// future instead of starting another one. Each flight carries a generation
/// number so that waiters of a finished flight only ever clear their own.
#[derive(Default)]
pub struct RefreshGate {
    slot: Mutex<Option<(u64, Flight)>>,
    next_generation: AtomicU64,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight operation, or start one with `start`.
    pub async fn run<F>(&self, start: F) -> Result<(), ApiError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), ApiError>>,
    {
        let (generation, flight) = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some((generation, flight)) => {
                    tracing::debug!(generation, "Joining in-flight session refresh");
                    (*generation, flight.clone())
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let flight = start().shared();
                    *slot = Some((generation, flight.clone()));
                    (generation, flight)
                }
            }
        };

        let result = flight.await;
        self.finish(generation).await;
        result
    }

    /// Whether a refresh is currently held by the gate.
    pub async fn is_in_flight(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Drop the held handle if its flight has already settled.
    ///
    /// A flight still running is left in place so later callers keep joining
    /// it instead of starting a second refresh.
    pub async fn clear(&self) {
        let mut slot = self.slot.lock().await;
        if matches!(slot.as_ref(), Some((_, flight)) if flight.peek().is_some()) {
            *slot = None;
        }
    }

    async fn finish(&self, generation: u64) {
        let mut slot = self.slot.lock().await;
        if matches!(slot.as_ref(), Some((held, _)) if *held == generation) {
            *slot = None;
        }
    }
}

//! Session lifecycle — login flag, single-flight refresh, logout.

use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;

use crate::auth::{RefreshGate, SessionConfig, SessionState};
use crate::error::{ApiError, SdkError, StorageError};
use crate::http::{ApiHttp, RequestOptions, Response};
use crate::shared::clock::Clock;
use crate::storage::{self, KeyValueStore};

/// Owns the persisted [`SessionState`] and talks to the auth endpoints.
///
/// The pipeline handed in here must not report to the error handler: a
/// failing refresh is handled by the recovery flow itself, not re-dispatched.
/// Clones share the same gate and store.
#[derive(Clone)]
pub struct SessionLifecycle {
    inner: Arc<Inner>,
}

struct Inner {
    http: ApiHttp,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    gate: RefreshGate,
}

impl SessionLifecycle {
    pub fn new(
        http: ApiHttp,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                store,
                clock,
                config,
                gate: RefreshGate::new(),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── Local state ──────────────────────────────────────────────────────

    /// Effective session state, applying lazy expiry.
    ///
    /// An expired or unreadable flag is deleted and reported as `None`.
    pub fn session_state(&self) -> Option<SessionState> {
        let key = &self.inner.config.storage_key;
        let state = match storage::load_json::<SessionState>(self.inner.store.as_ref(), key) {
            Ok(state) => state?,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session state");
                self.clear_local();
                return None;
            }
        };

        if state.is_active(self.inner.clock.now_ms()) {
            Some(state)
        } else {
            tracing::debug!(
                expires_at = state.expires_at_epoch_ms,
                "Session flag expired"
            );
            self.clear_local();
            None
        }
    }

    /// Whether the user counts as logged in right now.
    pub fn is_logged_in(&self) -> bool {
        self.session_state().is_some()
    }

    /// Record a successful login: logged in for one window from now.
    pub fn mark_logged_in(&self) -> Result<(), StorageError> {
        let state =
            SessionState::starting_at(self.inner.clock.now_ms(), self.inner.config.window);
        storage::save_json(
            self.inner.store.as_ref(),
            &self.inner.config.storage_key,
            &state,
        )
    }

    fn clear_local(&self) {
        if let Err(e) = self.inner.store.remove(&self.inner.config.storage_key) {
            tracing::warn!(error = %e, "Failed to delete session state");
        }
    }

    // ── Remote operations ────────────────────────────────────────────────

    /// Post credentials to the login endpoint and mark the session on success.
    ///
    /// The response is returned as-is so the caller can read the user profile.
    pub async fn login<B: Serialize + ?Sized>(
        &self,
        credentials: &B,
    ) -> Result<Response, SdkError> {
        let resp = self
            .inner
            .http
            .post(
                &self.inner.config.login_path,
                credentials,
                &RequestOptions::default(),
            )
            .await?;
        self.mark_logged_in()?;
        tracing::debug!("Logged in");
        Ok(resp)
    }

    /// Renew the session.
    ///
    /// Concurrent callers share one remote call. On success the flag is
    /// extended by one window from completion time; on failure it is deleted
    /// and the error is returned to every caller.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let this = self.clone();
        self.inner
            .gate
            .run(move || async move { this.refresh_remote().await }.boxed())
            .await
    }

    async fn refresh_remote(&self) -> Result<(), ApiError> {
        tracing::debug!("Refreshing session");
        let result = self
            .inner
            .http
            .post(
                &self.inner.config.refresh_path,
                &serde_json::json!({}),
                &RequestOptions::default(),
            )
            .await;

        match result {
            Ok(_) => {
                if let Err(e) = self.mark_logged_in() {
                    tracing::warn!(error = %e, "Session refreshed but flag could not be saved");
                }
                tracing::debug!("Session refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind(), code = e.code(), "Session refresh failed");
                self.clear_local();
                Err(e)
            }
        }
    }

    /// Best-effort remote invalidation followed by local cleanup.
    ///
    /// Never fails; calling it twice is harmless.
    pub async fn logout(&self) {
        if let Err(e) = self
            .inner
            .http
            .post(
                &self.inner.config.logout_path,
                &serde_json::json!({}),
                &RequestOptions::default(),
            )
            .await
        {
            tracing::debug!(error = %e, "Remote logout failed, clearing local session anyway");
        }
        self.clear_local();
    }

    /// Forget a settled refresh handle. Call before navigating away so a
    /// finished refresh is never reused by the next session. A refresh still
    /// in flight is kept.
    pub async fn abandon_refresh(&self) {
        self.inner.gate.clear().await;
    }

    pub async fn is_refreshing(&self) -> bool {
        self.inner.gate.is_in_flight().await
    }
}

//! Authentication — the persisted login flag, session refresh, login/logout.
//!
//! ## Session Model
//!
//! - Credentials (access and refresh tokens) live ONLY in cookies set by the
//!   backend. The SDK never reads or stores them; the HTTP client's cookie jar
//!   replays them.
//! - The SDK keeps a sliding-expiration flag ([`SessionState`]) in the host's
//!   key-value store so the app can tell, without a round trip, whether the
//!   user is probably signed in.
//! - Expiry is enforced lazily: a stale flag is deleted the next time it is
//!   read. There is no background timer.
//! - Refresh is single-flight: a burst of expired-token errors produces one
//!   remote refresh call, and every caller observes its outcome.

pub mod gate;
pub mod session;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use gate::RefreshGate;
pub use session::SessionLifecycle;

/// Default storage key for [`SessionState`].
pub const SESSION_KEY: &str = "session";

/// Sliding window granted by a login or a refresh.
pub const SESSION_WINDOW: Duration = Duration::from_secs(30 * 60);

// ============================================================================
// Session state
// ============================================================================

/// Persisted login flag.
///
/// Stored as `{"loggedIn": true, "expiresAtEpochMs": 1714557600000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub logged_in: bool,
    pub expires_at_epoch_ms: i64,
}

impl SessionState {
    /// A fresh logged-in state valid for `window` from `now_ms`.
    pub fn starting_at(now_ms: i64, window: Duration) -> Self {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        Self {
            logged_in: true,
            expires_at_epoch_ms: now_ms.saturating_add(window_ms),
        }
    }

    /// Whether this state counts as logged in at `now_ms`.
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.logged_in && now_ms < self.expires_at_epoch_ms
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Storage key, window, and endpoint paths used by [`SessionLifecycle`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub storage_key: String,
    pub window: Duration,
    pub login_path: String,
    pub refresh_path: String,
    pub logout_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: SESSION_KEY.to_string(),
            window: SESSION_WINDOW,
            login_path: "/api/auth/login".to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            logout_path: "/api/auth/logout".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_camel_case() {
        let state = SessionState::starting_at(1_000, Duration::from_secs(60));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"loggedIn":true,"expiresAtEpochMs":61000}"#);
    }

    #[test]
    fn test_state_expires_at_boundary() {
        let state = SessionState::starting_at(0, SESSION_WINDOW);
        let expires = state.expires_at_epoch_ms;
        assert_eq!(expires, 1_800_000);
        assert!(state.is_active(expires - 1));
        assert!(!state.is_active(expires));
    }

    #[test]
    fn test_oversized_window_saturates() {
        let state = SessionState::starting_at(1_000, Duration::MAX);
        assert_eq!(state.expires_at_epoch_ms, i64::MAX);
        assert!(state.is_active(i64::MAX - 1));
    }

    #[test]
    fn test_logged_out_flag_is_never_active() {
        let state = SessionState {
            logged_in: false,
            expires_at_epoch_ms: i64::MAX,
        };
        assert!(!state.is_active(0));
    }
}

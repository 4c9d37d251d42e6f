//! Per-request options and the error sink the pipeline reports failures to.

use std::time::Duration;

use crate::error::ApiError;

/// How the global error handler may react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Session recovery plus a user-visible notification for everything else.
    #[default]
    Full,
    /// Session recovery only; nothing is surfaced to the user.
    /// Used for best-effort calls such as telemetry.
    SessionOnly,
}

/// Options for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers for this call only.
    pub headers: Vec<(String, String)>,
    /// Overrides the client-wide timeout.
    pub timeout: Option<Duration>,
    pub dispatch: Dispatch,
}

impl RequestOptions {
    /// Options for calls whose failures must not reach the user.
    pub fn quiet() -> Self {
        Self {
            dispatch: Dispatch::SessionOnly,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Receives every failed request before the caller sees it.
///
/// Implementations must not block; anything slow (session refresh, logout)
/// is spawned.
pub trait ErrorSink: Send + Sync {
    fn on_error(&self, error: &ApiError, dispatch: Dispatch);
}

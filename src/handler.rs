//! Global error handler — one recovery action per error kind.
//!
//! | kind | action |
//! |---|---|
//! | `SessionExpired` | refresh; on success notify + reload, on failure logout + login redirect |
//! | `SessionInvalid` | logout + login redirect |
//! | anything else | non-blocking notification |
//!
//! The handler never retries the failed call; the reload after a renewed
//! session re-issues whatever the view needs.

use std::sync::Arc;

use crate::auth::SessionLifecycle;
use crate::error::{ApiError, ErrorKind};
use crate::http::{Dispatch, ErrorSink};
use crate::taxonomy::ErrorTaxonomy;

/// Text shown after a successful session renewal.
pub const SESSION_RENEWED_TEXT: &str = "Your session was renewed.";

/// Fallback when neither the catalog nor the error carries any text.
const GENERIC_FAILURE_TEXT: &str = "Something went wrong. Please try again.";

// ─── View collaborator ───────────────────────────────────────────────────────

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    /// Backend error code, empty when not applicable.
    pub code: String,
    pub text: String,
}

/// The app's view layer, as seen by the error handler.
pub trait ViewHost: Send + Sync {
    fn notify(&self, notification: Notification);
    /// Reload the current view from scratch.
    ///
    /// Called once per renewed `SessionExpired` error, so a burst of expired
    /// calls produces several reloads. Hosts must collapse repeated reloads.
    fn reload(&self);
    /// Navigate to the login entry point.
    fn redirect_to_login(&self);
}

/// View host for headless apps: everything goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogViewHost;

impl ViewHost for LogViewHost {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => tracing::info!(code = %notification.code, "{}", notification.text),
            Severity::Error => tracing::warn!(code = %notification.code, "{}", notification.text),
        }
    }

    fn reload(&self) {
        tracing::info!("View reload requested");
    }

    fn redirect_to_login(&self) {
        tracing::info!("Login redirect requested");
    }
}

// ─── Dispatch table ──────────────────────────────────────────────────────────

/// What the handler does for a given error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RefreshSession,
    ForceLogout,
    Notify,
    /// A notification that the dispatch mode suppressed.
    Suppressed,
}

impl Action {
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::SessionExpired => Action::RefreshSession,
            ErrorKind::SessionInvalid => Action::ForceLogout,
            ErrorKind::PermissionDenied
            | ErrorKind::ClientFault
            | ErrorKind::ServerFault
            | ErrorKind::NetworkError
            | ErrorKind::Unclassified => Action::Notify,
        }
    }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// Global error handler. Cheap to clone.
#[derive(Clone)]
pub struct ErrorHandler {
    session: SessionLifecycle,
    view: Arc<dyn ViewHost>,
    taxonomy: Arc<ErrorTaxonomy>,
}

impl ErrorHandler {
    pub fn new(
        session: SessionLifecycle,
        view: Arc<dyn ViewHost>,
        taxonomy: Arc<ErrorTaxonomy>,
    ) -> Self {
        Self {
            session,
            view,
            taxonomy,
        }
    }

    /// Fire-and-forget: run the action for `error` on the current runtime.
    pub fn handle(&self, error: ApiError) {
        self.spawn(error, Dispatch::Full);
    }

    /// Run the action for `error` to completion and report which one ran.
    pub async fn dispatch(&self, error: &ApiError, mode: Dispatch) -> Action {
        let action = Action::for_kind(error.kind());
        match action {
            Action::RefreshSession => self.recover_session().await,
            Action::ForceLogout => self.force_logout().await,
            Action::Notify if mode == Dispatch::SessionOnly => return Action::Suppressed,
            Action::Notify => self.view.notify(self.notification_for(error)),
            Action::Suppressed => {}
        }
        action
    }

    /// The notification shown for a surfaced error: catalog text for its code,
    /// otherwise the error's own message.
    pub fn notification_for(&self, error: &ApiError) -> Notification {
        let text = self
            .taxonomy
            .message_for(error.code())
            .map(str::to_string)
            .or_else(|| {
                let message = error.message().trim();
                (!message.is_empty()).then(|| message.to_string())
            })
            .unwrap_or_else(|| GENERIC_FAILURE_TEXT.to_string());

        Notification {
            severity: Severity::Error,
            code: error.code().to_string(),
            text,
        }
    }

    async fn recover_session(&self) {
        match self.session.refresh().await {
            Ok(()) => {
                self.session.abandon_refresh().await;
                self.view.notify(Notification {
                    severity: Severity::Info,
                    code: String::new(),
                    text: SESSION_RENEWED_TEXT.to_string(),
                });
                self.view.reload();
            }
            Err(e) => {
                tracing::debug!(error = %e, "Session could not be renewed, logging out");
                self.session.logout().await;
                self.session.abandon_refresh().await;
                self.view.redirect_to_login();
            }
        }
    }

    async fn force_logout(&self) {
        self.session.logout().await;
        self.session.abandon_refresh().await;
        self.view.redirect_to_login();
    }

    fn spawn(&self, error: ApiError, mode: Dispatch) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handler = self.clone();
                runtime.spawn(async move {
                    handler.dispatch(&error, mode).await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    kind = %error.kind(),
                    "No async runtime available, dropping error handler action"
                );
            }
        }
    }
}

impl ErrorSink for ErrorHandler {
    fn on_error(&self, error: &ApiError, dispatch: Dispatch) {
        self.spawn(error.clone(), dispatch);
    }
}

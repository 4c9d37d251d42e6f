//! High-level client — `StorefrontClient` wiring the pipeline, the error
//! handler, the session and the telemetry queue together.
//!
//! Screens talk to [`StorefrontClient::http`] for their own calls and to
//! [`StorefrontClient::telemetry`] for best-effort events. Failures reach the
//! global [`ErrorHandler`] automatically.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{SessionConfig, SessionLifecycle};
use crate::error::SdkError;
use crate::handler::{ErrorHandler, LogViewHost, ViewHost};
use crate::http::ApiHttp;
use crate::shared::clock::{Clock, SystemClock};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::taxonomy::ErrorTaxonomy;
use crate::telemetry::{TelemetryConfig, TelemetryRetryQueue};

/// The primary entry point for the storefront SDK.
#[derive(Clone)]
pub struct StorefrontClient {
    http: ApiHttp,
    session: SessionLifecycle,
    errors: ErrorHandler,
    telemetry: TelemetryRetryQueue,
}

impl StorefrontClient {
    pub fn builder() -> StorefrontClientBuilder {
        StorefrontClientBuilder::default()
    }

    /// The shared request pipeline. Failures are reported to the error handler.
    pub fn http(&self) -> &ApiHttp {
        &self.http
    }

    pub fn session(&self) -> &SessionLifecycle {
        &self.session
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn telemetry(&self) -> &TelemetryRetryQueue {
        &self.telemetry
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct StorefrontClientBuilder {
    base_url: String,
    timeout: Duration,
    store: Option<Arc<dyn KeyValueStore>>,
    view: Option<Arc<dyn ViewHost>>,
    clock: Option<Arc<dyn Clock>>,
    taxonomy: ErrorTaxonomy,
    session: SessionConfig,
    telemetry: TelemetryConfig,
}

impl Default for StorefrontClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            timeout: crate::network::DEFAULT_TIMEOUT,
            store: None,
            view: None,
            clock: None,
            taxonomy: ErrorTaxonomy::default(),
            session: SessionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl StorefrontClientBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Persistent store for the session flag and telemetry queue.
    /// Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// View layer receiving notifications and navigation requests.
    /// Defaults to [`LogViewHost`].
    pub fn view(mut self, view: Arc<dyn ViewHost>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn taxonomy(mut self, taxonomy: ErrorTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    pub fn session_window(mut self, window: Duration) -> Self {
        self.session.window = window;
        self
    }

    pub fn telemetry_config(mut self, config: TelemetryConfig) -> Self {
        self.telemetry = config;
        self
    }

    pub fn telemetry_capacity(mut self, capacity: usize) -> Self {
        self.telemetry.capacity = capacity;
        self
    }

    pub fn build(self) -> Result<StorefrontClient, SdkError> {
        let base_url = url::Url::parse(&self.base_url)
            .map_err(|e| SdkError::Config(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SdkError::Config(format!(
                "Unsupported base URL scheme: {}",
                base_url.scheme()
            )));
        }
        if self.telemetry.capacity == 0 {
            return Err(SdkError::Config(
                "Telemetry queue capacity must be at least 1".to_string(),
            ));
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let view = self.view.unwrap_or_else(|| Arc::new(LogViewHost));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let taxonomy = Arc::new(self.taxonomy);

        // Session calls use the sink-less pipeline so a failing refresh never
        // re-enters the handler.
        let transport = ApiHttp::new(base_url.as_str(), self.timeout, taxonomy.clone())?;
        let session = SessionLifecycle::new(transport.clone(), store.clone(), clock, self.session);
        let errors = ErrorHandler::new(session.clone(), view, taxonomy);
        let http = transport.with_sink(Arc::new(errors.clone()));
        let telemetry = TelemetryRetryQueue::new(http.clone(), store, self.telemetry);

        Ok(StorefrontClient {
            http,
            session,
            errors,
            telemetry,
        })
    }
}

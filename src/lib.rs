//! # Storefront SDK
//!
//! Client core for the storefront/marketplace API: the shared request
//! pipeline, its typed error taxonomy, session recovery, and a durable retry
//! queue for telemetry events.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Error types, taxonomy, storage, clock
//! 2. **HTTP** — `ApiHttp`: classify failures, notify the error sink, return
//! 3. **Auth** — `SessionLifecycle` with lazy expiry and single-flight refresh
//! 4. **Recovery** — `ErrorHandler` (refresh / logout / notify) and
//!    `TelemetryRetryQueue`
//! 5. **High-Level Client** — `StorefrontClient` wiring it all together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_sdk::prelude::*;
//!
//! let client = StorefrontClient::builder()
//!     .base_url("https://api.shop.example.com")
//!     .store(Arc::new(FileStore::open("./state")?))
//!     .build()?;
//!
//! let categories: serde_json::Value = client.http().get_json("/api/categories").await?;
//! client.telemetry().spawn_submit(serde_json::json!({ "page": "/categories" }));
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Unified SDK error types.
pub mod error;

/// Error code → kind mapping and user-facing messages.
pub mod taxonomy;

/// Persistent key-value store.
pub mod storage;

/// Shared utilities (clock).
pub mod shared;

/// Network defaults.
pub mod network;

// ── Layer 2: HTTP ────────────────────────────────────────────────────────────

/// Request pipeline.
pub mod http;

// ── Layer 3: Auth ────────────────────────────────────────────────────────────

/// Session flag, refresh, login/logout.
pub mod auth;

// ── Layer 4: Recovery ────────────────────────────────────────────────────────

/// Global error handler.
pub mod handler;

/// Telemetry retry queue.
pub mod telemetry;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `StorefrontClient` — the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Errors
    pub use crate::error::{ApiError, ErrorEnvelope, ErrorKind, SdkError, StorageError};
    pub use crate::taxonomy::ErrorTaxonomy;

    // Storage + time
    pub use crate::shared::clock::{Clock, ManualClock, SystemClock};
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};

    // HTTP
    pub use crate::http::{ApiHttp, Dispatch, ErrorSink, RequestOptions, Response};

    // Auth
    pub use crate::auth::{SessionConfig, SessionLifecycle, SessionState};

    // Recovery
    pub use crate::handler::{Action, ErrorHandler, LogViewHost, Notification, Severity, ViewHost};
    pub use crate::telemetry::{FlushReport, SubmitOutcome, TelemetryConfig, TelemetryRetryQueue};

    // Client
    pub use crate::client::{StorefrontClient, StorefrontClientBuilder};

    // Network
    pub use crate::network::DEFAULT_API_URL;
}

//! Unified SDK error types.
//!
//! [`ApiError`] is the typed failure every request returns. It is either a
//! transport failure (no response at all) or a remote rejection carrying the
//! backend's [`ErrorEnvelope`], classified into an [`ErrorKind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ─── Error envelope ──────────────────────────────────────────────────────────

/// Structured error body returned by the remote API on a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub path: String,
}

impl ErrorEnvelope {
    /// Parse an envelope from a response body.
    ///
    /// Returns `None` unless the body is a JSON object carrying a non-empty
    /// `code` or `message`; anything else (HTML error pages, empty bodies,
    /// unrelated JSON) is not an envelope.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
        if envelope.code.is_empty() && envelope.message.is_empty() {
            return None;
        }
        Some(envelope)
    }
}

// ─── Error kind ──────────────────────────────────────────────────────────────

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Access token expired; recoverable by a session refresh.
    SessionExpired,
    /// Access or refresh token invalid or missing; requires a new login.
    SessionInvalid,
    PermissionDenied,
    /// Bad input or unsupported operation. Not retryable.
    ClientFault,
    /// Internal server error, plausibly transient.
    ServerFault,
    /// No response was received.
    NetworkError,
    Unclassified,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::SessionInvalid => "session_invalid",
            Self::PermissionDenied => "permission_denied",
            Self::ClientFault => "client_fault",
            Self::ServerFault => "server_fault",
            Self::NetworkError => "network_error",
            Self::Unclassified => "unclassified",
        }
    }

    /// Whether a telemetry event that failed with this kind is worth keeping
    /// for a later replay.
    pub fn is_queueable(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired | Self::SessionInvalid | Self::ServerFault | Self::NetworkError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Typed request error ─────────────────────────────────────────────────────

/// Typed failure of a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{kind} [{}] {}: {}", .envelope.code, .envelope.status, .envelope.message)]
    Remote {
        kind: ErrorKind,
        envelope: ErrorEnvelope,
    },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Remote { kind, .. } => *kind,
        }
    }

    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::Network(_) => None,
            Self::Remote { envelope, .. } => Some(envelope),
        }
    }

    /// Error code from the envelope; empty for network failures.
    pub fn code(&self) -> &str {
        self.envelope().map(|e| e.code.as_str()).unwrap_or("")
    }

    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        self.envelope().map(|e| e.status)
    }

    /// Human-readable message: the envelope message, or the transport error text.
    pub fn message(&self) -> &str {
        match self {
            Self::Network(message) => message,
            Self::Remote { envelope, .. } => &envelope.message,
        }
    }

    pub fn is_queueable(&self) -> bool {
        self.kind().is_queueable()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

// ─── Storage errors ──────────────────────────────────────────────────────────

/// Persistent key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

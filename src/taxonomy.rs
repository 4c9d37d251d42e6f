//! Error taxonomy — maps backend error codes to [`ErrorKind`] and to the
//! localized text shown to the user.
//!
//! The catalog is open: unknown codes classify as [`ErrorKind::Unclassified`]
//! and apps can register extra codes or prefixes at build time.

use std::collections::HashMap;

use crate::error::{ErrorEnvelope, ErrorKind};

/// Code → kind table plus the user-facing message catalog.
#[derive(Debug, Clone)]
pub struct ErrorTaxonomy {
    exact: HashMap<String, ErrorKind>,
    /// Prefix rules, matched longest first.
    prefixes: Vec<(String, ErrorKind)>,
    messages: HashMap<String, String>,
}

impl Default for ErrorTaxonomy {
    fn default() -> Self {
        let mut taxonomy = Self::empty();
        for (code, kind) in [
            ("S002", ErrorKind::SessionExpired),
            ("G009", ErrorKind::SessionExpired),
            ("S001", ErrorKind::SessionInvalid),
            ("G008", ErrorKind::SessionInvalid),
            ("S003", ErrorKind::SessionInvalid),
            ("S004", ErrorKind::SessionInvalid),
            ("G007", ErrorKind::PermissionDenied),
            ("G001", ErrorKind::ServerFault),
        ] {
            taxonomy.exact.insert(code.to_string(), kind);
        }
        taxonomy
            .prefixes
            .push(("F00".to_string(), ErrorKind::ClientFault));

        for (code, text) in [
            ("S002", "Your session has expired."),
            ("G009", "Your session has expired."),
            ("S001", "Please sign in to continue."),
            ("G008", "Please sign in to continue."),
            ("S003", "Please sign in to continue."),
            ("S004", "Your sign-in is no longer valid. Please sign in again."),
            ("G007", "You do not have permission to do that."),
            ("G001", "Something went wrong on our side. Please try again."),
        ] {
            taxonomy.messages.insert(code.to_string(), text.to_string());
        }
        taxonomy
    }
}

impl ErrorTaxonomy {
    /// A taxonomy with no rules; every code is unclassified.
    pub fn empty() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: Vec::new(),
            messages: HashMap::new(),
        }
    }

    /// Register (or override) an exact code.
    pub fn with_code(mut self, code: &str, kind: ErrorKind) -> Self {
        self.exact.insert(code.to_string(), kind);
        self
    }

    /// Register a prefix rule, e.g. `"F00"` for the file-operation family.
    pub fn with_prefix(mut self, prefix: &str, kind: ErrorKind) -> Self {
        self.prefixes.retain(|(p, _)| p != prefix);
        self.prefixes.push((prefix.to_string(), kind));
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Register localized text for a code.
    pub fn with_message(mut self, code: &str, text: &str) -> Self {
        self.messages.insert(code.to_string(), text.to_string());
        self
    }

    /// Classify a backend error code.
    pub fn classify(&self, code: &str) -> ErrorKind {
        if code.is_empty() {
            return ErrorKind::Unclassified;
        }
        if let Some(kind) = self.exact.get(code) {
            return *kind;
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Unclassified)
    }

    /// Classify an envelope. Envelopes synthesized from a bare status (no
    /// code) fall back on the status: 5xx is a server fault.
    pub fn classify_envelope(&self, envelope: &ErrorEnvelope) -> ErrorKind {
        if envelope.code.is_empty() && (500..=599).contains(&envelope.status) {
            return ErrorKind::ServerFault;
        }
        self.classify(&envelope.code)
    }

    /// Localized text for a code, if the catalog has one.
    pub fn message_for(&self, code: &str) -> Option<&str> {
        self.messages.get(code).map(String::as_str)
    }
}

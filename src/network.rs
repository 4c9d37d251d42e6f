//! Network defaults for the storefront SDK.

use std::time::Duration;

/// Default REST API base URL (local development backend).
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Client-wide request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

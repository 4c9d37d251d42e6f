//! Request pipeline — `ApiHttp`.
//!
//! Every outbound call goes through [`ApiHttp::send`]. Failures are turned into
//! a typed [`ApiError`] in two steps: classify (transport failure or envelope
//! + taxonomy), then notify the configured [`ErrorSink`] and return the same
//! error to the caller. The pipeline never recovers an error itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ErrorEnvelope, SdkError};
use crate::http::options::{ErrorSink, RequestOptions};
use crate::taxonomy::ErrorTaxonomy;

/// Raw successful response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Shared HTTP client for the storefront REST API.
pub struct ApiHttp {
    base_url: String,
    client: Client,
    taxonomy: Arc<ErrorTaxonomy>,
    sink: Option<Arc<dyn ErrorSink>>,
}

impl ApiHttp {
    /// Build a pipeline with no error sink attached.
    ///
    /// Cookies set by the API (session and refresh credentials) are kept in
    /// an in-process jar shared by every clone of this client.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        taxonomy: Arc<ErrorTaxonomy>,
    ) -> Result<Self, SdkError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .cookie_store(true)
            .build()
            .map_err(|e| SdkError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            taxonomy,
            sink: None,
        })
    }

    /// A clone of this pipeline (same connection pool and cookie jar) that
    /// reports failures to `sink`.
    pub fn with_sink(&self, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            sink: Some(sink),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn taxonomy(&self) -> &ErrorTaxonomy {
        &self.taxonomy
    }

    // ── Public request API ───────────────────────────────────────────────

    /// Send a request. `path` is relative to the base URL.
    ///
    /// On failure the error is handed to the error sink first, then returned.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        let result = self.execute(&method, path, body, options).await;
        if let Err(err) = &result {
            tracing::debug!(
                method = %method,
                path,
                kind = %err.kind(),
                code = err.code(),
                status = ?err.status(),
                "Request failed"
            );
            if let Some(sink) = &self.sink {
                sink.on_error(err, options.dispatch);
            }
        }
        result
    }

    pub async fn get(&self, path: &str, options: &RequestOptions) -> Result<Response, ApiError> {
        self.send(Method::GET, path, None::<&()>, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        self.send(Method::POST, path, Some(body), options).await
    }

    pub async fn delete(&self, path: &str, options: &RequestOptions) -> Result<Response, ApiError> {
        self.send(Method::DELETE, path, None::<&()>, options).await
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        let resp = self.get(path, &RequestOptions::default()).await?;
        Ok(resp.json()?)
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SdkError> {
        let resp = self.post(path, body, &RequestOptions::default()).await?;
        Ok(resp.json()?)
    }

    // ── Internal ─────────────────────────────────────────────────────────

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method.clone(), &url);

        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            req = req.timeout(timeout);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();

        if status.is_success() {
            return Ok(Response {
                status: status.as_u16(),
                body,
            });
        }

        Err(classify_failure(&self.taxonomy, status, &body, path))
    }
}

impl Clone for ApiHttp {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            taxonomy: self.taxonomy.clone(),
            sink: self.sink.clone(),
        }
    }
}

/// Longest raw body kept as the message of a synthesized envelope.
const MAX_RAW_MESSAGE: usize = 512;

/// Turn a non-2xx response into a typed error.
///
/// The envelope fields are copied as sent; a zero status or empty path is
/// filled from the response itself. Bodies without an envelope get one
/// synthesized from the status and raw text, with an empty code.
pub(crate) fn classify_failure(
    taxonomy: &ErrorTaxonomy,
    status: StatusCode,
    body: &[u8],
    path: &str,
) -> ApiError {
    let envelope = match ErrorEnvelope::parse(body) {
        Some(mut envelope) => {
            if envelope.status == 0 {
                envelope.status = status.as_u16();
            }
            if envelope.path.is_empty() {
                envelope.path = path.to_string();
            }
            envelope
        }
        None => {
            let raw = String::from_utf8_lossy(body);
            let raw = raw.trim();
            let message = if raw.is_empty() || raw.len() > MAX_RAW_MESSAGE {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                raw.to_string()
            };
            ErrorEnvelope {
                code: String::new(),
                message,
                status: status.as_u16(),
                timestamp: Utc::now().to_rfc3339(),
                path: path.to_string(),
            }
        }
    };

    ApiError::Remote {
        kind: taxonomy.classify_envelope(&envelope),
        envelope,
    }
}

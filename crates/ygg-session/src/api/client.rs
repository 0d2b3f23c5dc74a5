//! HTTP transport for the Yggdrasil routes.
//!
//! The session layer only needs "POST this JSON, give me back JSON", so the
//! transport is the [`HttpPoster`] trait. [`ReqwestPoster`] is the default
//! implementation; tests substitute a fake.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::TransportError;

/// HTTP request timeout in seconds.
/// The auth server answers quickly; anything slower than this is a dead route.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Posts a JSON body to a URL and hands back the JSON response.
///
/// `Ok(None)` means the server answered successfully without a body
/// (`validate` and `invalidate` reply with 204). Error payloads sent with a
/// non-2xx status are still returned as `Ok(Some(..))` so the caller can read
/// `error`/`errorMessage`/`cause`.
pub trait HttpPoster: Send + Sync {
    fn post(
        &self,
        url: Url,
        body: Value,
    ) -> impl Future<Output = Result<Option<Value>, TransportError>> + Send;
}

impl<T: HttpPoster> HttpPoster for Arc<T> {
    fn post(
        &self,
        url: Url,
        body: Value,
    ) -> impl Future<Output = Result<Option<Value>, TransportError>> + Send {
        (**self).post(url, body)
    }
}

/// Unauthenticated reqwest transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ReqwestPoster {
    client: Client,
}

impl ReqwestPoster {
    /// Direct connection (no proxy) with the default timeout
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), None)
    }

    /// Build a transport with a request timeout and an optional proxy URL.
    /// System proxy settings are ignored either way.
    pub fn with_options(timeout: Duration, proxy: Option<&str>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(timeout).no_proxy();
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Interpret a response status and body.
    fn decode_body(status: StatusCode, body: &str) -> Result<Option<Value>, TransportError> {
        if body.trim().is_empty() {
            return if status.is_success() {
                Ok(None)
            } else {
                Err(TransportError::from_status(status, body))
            };
        }

        match serde_json::from_str::<Value>(body) {
            Ok(value) if status.is_success() => Ok(Some(value)),
            Ok(value) if Self::is_error_payload(&value) => {
                debug!(status = %status, "Server returned an error payload");
                Ok(Some(value))
            }
            Ok(_) => Err(TransportError::from_status(status, body)),
            Err(e) if status.is_success() => Err(TransportError::InvalidResponse(format!(
                "Failed to parse JSON response: {}",
                e
            ))),
            Err(_) => Err(TransportError::from_status(status, body)),
        }
    }

    fn is_error_payload(value: &Value) -> bool {
        value
            .get("error")
            .and_then(Value::as_str)
            .is_some_and(|e| !e.is_empty())
    }
}

impl HttpPoster for ReqwestPoster {
    async fn post(&self, url: Url, body: Value) -> Result<Option<Value>, TransportError> {
        debug!(url = %url, "Sending POST request");

        let response = self
            .client
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .inspect_err(|e| warn!(url = %url, error = %e, "POST request failed"))?;

        let status = response.status();
        let text = response.text().await?;
        Self::decode_body(status, &text)
    }
}

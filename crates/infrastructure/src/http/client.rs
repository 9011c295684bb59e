//! Resilient request client.
//!
//! Wraps `reqwest::Client` with a base URL, a shared set of default
//! headers and a retry budget. Every failure that leaves the client is a
//! [`ResponseError`]; callers never see `reqwest` errors.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use tether_application::ports::ApiCredentials;
use tether_domain::{DomainError, DomainResult, HttpMethod, ProblemKind, ResponseError};

use super::options::RequestOptions;
use super::retry::RetryPolicy;
use crate::error::{InfrastructureError, InfrastructureResult};

/// Headers every client starts with.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("accept", "application/json"),
    ("content-type", "application/json"),
];

/// Per-attempt timeout used by [`ApiClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BEARER_PREFIX: &str = "Bearer ";

/// Why a single attempt failed.
enum AttemptFailure {
    /// The server answered with a non-2xx status.
    Status { status: u16, body: Option<Vec<u8>> },
    /// No usable response.
    Transport(reqwest::Error),
}

impl AttemptFailure {
    fn into_response_error(self) -> ResponseError {
        match self {
            Self::Status { status, body } => {
                ResponseError::from_response(status, body.as_deref().and_then(error_message))
            }
            Self::Transport(_) => ResponseError::network(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Status { status, .. } => format!("status {status}"),
            Self::Transport(e) if e.is_timeout() => "timeout".to_string(),
            Self::Transport(e) if e.is_connect() => format!("connection failed: {e}"),
            Self::Transport(e) => e.to_string(),
        }
    }
}

/// Extracts the server-provided `errorMessage` from an error body.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("errorMessage")?
        .as_str()
        .map(str::to_owned)
}

/// Parses a success body: JSON when possible, else the raw text.
fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn default_header_map() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// HTTP client shared by the whole application.
///
/// Clones share the default headers, so a credential registered through
/// one clone is sent by all of them. Writers are not coordinated: the
/// last call to [`ApiClient::set_headers`] or
/// [`ApiCredentials::set_access_token`] wins.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    headers: Arc<RwLock<HeaderMap>>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client with the default timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(base_url: impl Into<String>) -> InfrastructureResult<Self> {
        Self::with_settings(base_url, RetryPolicy::new(), DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit retry policy and per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn with_settings(
        base_url: impl Into<String>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> InfrastructureResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Self::with_client(client, base_url, retry)
    }

    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> InfrastructureResult<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| InfrastructureError::InvalidUrl {
            url: base_url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: Arc::new(RwLock::new(default_header_map())),
            retry,
        })
    }

    /// Returns the base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Merges `headers` into the defaults sent with every request.
    ///
    /// Same-named headers are replaced; the rest are kept. Either all
    /// headers are applied or none.
    ///
    /// # Errors
    ///
    /// Returns an error if a name or value is not a valid HTTP header.
    pub fn set_headers<K, V>(&self, headers: impl IntoIterator<Item = (K, V)>) -> DomainResult<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DomainError::InvalidHeaderName(name.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| DomainError::InvalidHeaderValue(value.to_string()))?;
            parsed.push((name, value));
        }

        let mut current = self.headers.write();
        for (name, value) in parsed {
            current.insert(name, value);
        }
        Ok(())
    }

    /// Returns the headers currently sent with every request.
    ///
    /// Names are lowercase; values that are not valid UTF-8 are skipped.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        self.headers
            .read()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect()
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn get(&self, path: &str, options: &RequestOptions) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Get, path, None, options).await
    }

    /// Issues a HEAD request; success resolves with `null`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn head(&self, path: &str, options: &RequestOptions) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Head, path, None, options).await
    }

    /// Issues a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn delete(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Delete, path, None, options).await
    }

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Post, path, Some(body), options)
            .await
    }

    /// Issues a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn put(
        &self,
        path: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Put, path, Some(body), options)
            .await
    }

    /// Issues a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] once the retry budget is exhausted.
    pub async fn patch(
        &self,
        path: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Value, ResponseError> {
        self.request(HttpMethod::Patch, path, Some(body), options)
            .await
    }

    /// Issues a request, retrying every failed attempt until the budget
    /// runs out.
    ///
    /// The body is only sent for methods that carry one. Success resolves
    /// with the parsed JSON body, the raw text if it is not JSON, or
    /// `null` when there is no body.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] classified from the last attempt.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, ResponseError> {
        let url = self.resolve_url(path, &options.query)?;
        let retries = options.retries.unwrap_or(self.retry.retries);
        let body = body.filter(|_| method.has_body());

        let mut retry = 0;
        loop {
            let failure = match self.attempt(method, url.clone(), body).await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            if retry >= retries {
                let error = failure.into_response_error();
                tracing::error!(
                    event = "request_failed",
                    method = %method,
                    url = %url,
                    attempts = retry + 1,
                    status = ?error.status,
                    problem = %error.problem,
                    "Request failed"
                );
                return Err(error);
            }

            let delay = self.retry.delay_for(retry);
            tracing::warn!(
                event = "request_retry",
                method = %method,
                url = %url,
                reason = %failure.describe(),
                retry = retry + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Request attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    fn resolve_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ResponseError> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };

        let mut url = Url::parse(&joined).map_err(|e| {
            ResponseError::new(
                format!("invalid URL {joined}: {e}"),
                None,
                ProblemKind::UnknownError,
            )
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn attempt(
        &self,
        method: HttpMethod,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, AttemptFailure> {
        let headers = self.headers.read().clone();
        let mut builder = self
            .client
            .request(to_reqwest_method(method), url)
            .headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(AttemptFailure::Transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = if method.reads_body() {
                response.bytes().await.ok().map(|bytes| bytes.to_vec())
            } else {
                None
            };
            return Err(AttemptFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        if !method.reads_body() {
            return Ok(Value::Null);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(AttemptFailure::Transport)?;
        Ok(parse_body(&bytes))
    }
}

impl ApiCredentials for ApiClient {
    fn set_access_token(&self, token: &str) {
        match HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.write().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!(
                    event = "credential_rejected",
                    "Token is not a valid header value, credential not registered"
                );
            }
        }
    }

    fn remove_access_token(&self) {
        self.headers.write().remove(AUTHORIZATION);
    }

    fn access_token(&self) -> Option<String> {
        self.headers
            .read()
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix(BEARER_PREFIX)
            .map(str::to_owned)
    }
}

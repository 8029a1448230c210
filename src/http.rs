//! HTTP request helper.
//!
//! Wraps a `reqwest::Client` with a single-attempt path and a retrying path.
//! Neither path fails on an error status: the status code and body are
//! returned and callers decide. Only failures that leave no response behind
//! (bad url, connection, TLS, timeout) come back as [`HttpError`].

use std::time::Duration;

use reqwest::{
    Client, Method, StatusCode, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, RETRY_AFTER},
};
use tokio::time::sleep;

use crate::{config::HttpSettings, error, error::HttpError, warning};

/// Exponential backoff for the retrying path.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (zero based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.min_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }

    pub fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }

    // Only failures to reach the server or to hear back in time; errors
    // building the request repeat on every attempt.
    fn should_retry_error(err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout()
    }
}

/// A request that can be sent more than once.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    bearer: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            bearer: None,
        }
    }

    /// Request carrying a JSON document, sent as `application/json`.
    pub fn with_json_body(method: Method, url: impl Into<String>, body: String) -> Self {
        Self {
            body: Some(body),
            ..Self::new(method, url)
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn has_bearer(&self) -> bool {
        self.bearer.is_some()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_u16() >= 400
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Sends `request` once, or through the retrying path when `with_retry`
    /// is set. Responses with status >= 400 are logged and returned as is.
    pub async fn execute(
        &self,
        request: &HttpRequest,
        with_retry: bool,
    ) -> Result<HttpResponse, HttpError> {
        let url = Url::parse(&request.url).map_err(|e| HttpError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let retries = if with_retry { self.retry.max_retries } else { 0 };
        let mut attempt = 0;

        let response = loop {
            let result = self.send_once(request, url.clone()).await;
            let can_retry = attempt < retries;

            match result {
                Ok((response, retry_after))
                    if can_retry && RetryPolicy::should_retry_status(response.status) =>
                {
                    let wait = retry_after
                        .map(|d| d.min(self.retry.max_wait))
                        .unwrap_or_else(|| self.retry.backoff(attempt));
                    warning!(
                        "{} {} returned HTTP {}, retrying in {:?} ({}/{})",
                        request.method,
                        request.url,
                        response.status.as_u16(),
                        wait,
                        attempt + 1,
                        retries
                    );
                    sleep(wait).await;
                }
                Ok((response, _)) => break response,
                Err(err) if can_retry && RetryPolicy::should_retry_error(&err) => {
                    let wait = self.retry.backoff(attempt);
                    warning!(
                        "{} {} failed: {}, retrying in {:?} ({}/{})",
                        request.method,
                        request.url,
                        err,
                        wait,
                        attempt + 1,
                        retries
                    );
                    sleep(wait).await;
                }
                Err(err) => {
                    error!("{} {} failed: {}", request.method, request.url, err);
                    return Err(HttpError::Transport {
                        method: request.method.clone(),
                        url: request.url.clone(),
                        source: err,
                    });
                }
            }

            attempt += 1;
        };

        log_error_response(request, &response);
        Ok(response)
    }

    async fn send_once(
        &self,
        request: &HttpRequest,
        url: Url,
    ) -> Result<(HttpResponse, Option<Duration>), reqwest::Error> {
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = &request.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let retry_after = retry_after(status, response.headers());
        let body = response.text().await?;

        Ok((HttpResponse { status, body }, retry_after))
    }
}

fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }

    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn log_error_response(request: &HttpRequest, response: &HttpResponse) {
    if response.is_error() {
        error!("Url: {}", request.url);
        error!("HTTP status code: {}", response.status.as_u16());
        error!("Response body: {}", response.body);
    }
}

/// Reads a whole file into a string.
pub async fn read_file_as_string(path: &std::path::Path) -> crate::Res<String> {
    async_fs::read_to_string(path)
        .await
        .map_err(|source| crate::Error::Io {
            path: path.to_path_buf(),
            source,
        })
}

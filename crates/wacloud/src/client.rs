//! Bearer-authenticated REST client for the Graph API.
//!
//! A thin wrapper over `reqwest`: endpoints are resolved against the
//! configured base URL, the API token is injected as a bearer header, and
//! JSON bodies are (de)serialized. Non-2xx responses are normalized into an
//! [`HttpError`] and handed to the configured [`ErrorHandler`], whose outcome
//! becomes the outcome of the call. There is no retry.

use crate::config::RestClientConfig;
use crate::error::{ApiError, ApiResult, HttpError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Receives every non-2xx response.
///
/// `Ok(value)` replaces the failed response as the call's result; `Err`
/// becomes the call's error.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, error: HttpError) -> ApiResult<serde_json::Value>;
}

struct FnErrorHandler<F>(F);

#[async_trait]
impl<F, Fut> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(HttpError) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<serde_json::Value>> + Send,
{
    async fn handle(&self, error: HttpError) -> ApiResult<serde_json::Value> {
        (self.0)(error).await
    }
}

/// How `get_raw` reads the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Json,
    ArrayBuffer,
    Stream,
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Resolve the endpoint against this URL instead of the client's base.
    pub base_url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Body returned by [`RestClient::get_raw`].
pub enum RawBody {
    Json(serde_json::Value),
    Bytes(Bytes),
    Stream(BoxStream<'static, ApiResult<Bytes>>),
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

enum Outcome {
    Response(reqwest::Response),
    Handled(serde_json::Value),
}

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: RestClientConfig,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl RestClient {
    pub fn new(config: RestClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .connect_timeout(Duration::from_secs(config.connect_timeout_sec))
            .build()
            .map_err(|e| ApiError::network(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            config,
            error_handler: None,
        })
    }

    pub fn with_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Install a closure as the error handler.
    pub fn on_error<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HttpError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<serde_json::Value>> + Send + 'static,
    {
        self.with_error_handler(FnErrorHandler(f))
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Update the bearer token (e.g. after a refresh).
    pub fn set_api_token(&mut self, token: impl Into<String>) {
        self.config.api_token = Some(token.into());
    }

    // ─── URL helpers ─────────────────────────────────────────────────

    /// Resolve an endpoint to an absolute URL.
    ///
    /// A per-call base URL is joined with URL semantics; the configured base
    /// is a plain prefix (`{base}/{endpoint}`); without either the endpoint
    /// must already be absolute.
    pub fn resolve_url(&self, endpoint: &str, options: &RequestOptions) -> ApiResult<Url> {
        let invalid = |e: url::ParseError| ApiError::invalid_parameter(format!("Invalid URL for '{}': {}", endpoint, e));

        if let Some(ref base) = options.base_url {
            return Url::parse(base).and_then(|b| b.join(endpoint)).map_err(invalid);
        }

        match self.config.base_url {
            Some(ref base) => Url::parse(&format!(
                "{}/{}",
                base.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ))
            .map_err(invalid),
            None => Url::parse(endpoint).map_err(invalid),
        }
    }

    fn headers(&self, options: &RequestOptions) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::invalid_parameter(format!("Invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::invalid_parameter(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::invalid_parameter(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    // ─── HTTP verbs ──────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let outcome = self.send(Method::GET, endpoint, params, None, options).await?;
        Self::json(outcome).await
    }

    /// GET honouring [`RequestOptions::response_type`].
    pub async fn get_raw(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> ApiResult<RawBody> {
        let resp = match self.send(Method::GET, endpoint, params, None, options).await? {
            Outcome::Response(resp) => resp,
            Outcome::Handled(value) => return Ok(RawBody::Json(value)),
        };

        match options.response_type {
            ResponseType::Json => Self::json(Outcome::Response(resp)).await.map(RawBody::Json),
            ResponseType::ArrayBuffer => Ok(RawBody::Bytes(resp.bytes().await?)),
            ResponseType::Stream => Ok(RawBody::Stream(
                resp.bytes_stream().map(|chunk| chunk.map_err(ApiError::from)).boxed(),
            )),
        }
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &B,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(payload)?;
        let outcome = self.send(Method::POST, endpoint, &[], Some(body), options).await?;
        Self::json(outcome).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &B,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(payload)?;
        let outcome = self.send(Method::PUT, endpoint, &[], Some(body), options).await?;
        Self::json(outcome).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let outcome = self.send(Method::DELETE, endpoint, params, None, options).await?;
        Self::json(outcome).await
    }

    // ─── Core request ────────────────────────────────────────────────

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<serde_json::Value>,
        options: &RequestOptions,
    ) -> ApiResult<Outcome> {
        let url = self.resolve_url(endpoint, options)?;
        debug!("{} {}", method, url);

        let mut req = self
            .http
            .request(method, url.clone())
            .headers(self.headers(options)?);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(ref b) = body {
            req = req.json(b);
        }
        if let Some(timeout) = options.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(Outcome::Response(resp));
        }

        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let text = resp.text().await.unwrap_or_default();
        let error = HttpError::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            url.as_str(),
            headers,
            text,
        );
        debug!("{} from {}", error.message, url);

        match self.error_handler {
            Some(ref handler) => handler.handle(error).await.map(Outcome::Handled),
            None => Err(ApiError::from_http(error)),
        }
    }

    async fn json<T: DeserializeOwned>(outcome: Outcome) -> ApiResult<T> {
        let value = match outcome {
            Outcome::Handled(value) => value,
            Outcome::Response(resp) => {
                let text = resp.text().await?;
                if text.trim().is_empty() {
                    serde_json::json!({ "success": true })
                } else {
                    serde_json::from_str(&text)?
                }
            }
        };
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.config.base_url)
            .field("has_api_token", &self.config.api_token.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

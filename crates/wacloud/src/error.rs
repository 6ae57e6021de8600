//! Crate-level error types.
//!
//! [`ApiError`] covers outbound Graph API calls and configuration;
//! [`DispatchError`] covers a webhook dispatch pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias for `Result<T, ApiError>`.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error type callbacks and error handlers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════
//  REST client errors
// ═══════════════════════════════════════════════════════════════════════

/// Uniform error type for REST calls and configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    /// Sub-error detail from the upstream API.
    pub details: Option<String>,
    /// HTTP status code if originated from an API call.
    pub http_status: Option<u16>,
    /// The normalized non-2xx response, when there was one.
    #[serde(skip)]
    pub http: Option<HttpError>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref d) = self.details {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Categorised error codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    // ── Auth ─────────────────────────────────────────────
    InvalidAccessToken,
    TokenExpired,
    InsufficientPermissions,
    // ── API ──────────────────────────────────────────────
    RateLimited,
    InvalidParameter,
    ResourceNotFound,
    /// Any other non-2xx status.
    HttpStatus,
    // ── Internal ─────────────────────────────────────────
    NotConfigured,
    NetworkError,
    SerializationError,
    InternalError,
}

impl ApiError {
    fn new(code: ApiErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            details: None,
            http_status: None,
            http: None,
        }
    }

    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotConfigured, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NetworkError, msg)
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::SerializationError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InternalError, msg)
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidParameter, msg)
    }

    /// Classify a normalized non-2xx response.
    pub fn from_http(http: HttpError) -> Self {
        let (message, details) = match http.graph_error {
            Some(ref g) => (
                g.message.clone(),
                Some(format!(
                    "type={}, code={}, error_subcode={}, fbtrace_id={}",
                    g.error_type.as_deref().unwrap_or(""),
                    g.code.unwrap_or(0),
                    g.error_subcode.unwrap_or(0),
                    g.fbtrace_id.as_deref().unwrap_or(""),
                )),
            ),
            None => (
                http.message.clone(),
                (!http.body.is_empty()).then(|| http.body.chars().take(500).collect()),
            ),
        };
        Self {
            code: Self::classify(http.status, &message),
            message,
            details,
            http_status: Some(http.status),
            http: Some(http),
        }
    }

    fn classify(status: u16, msg: &str) -> ApiErrorCode {
        let lower = msg.to_lowercase();
        match status {
            400 => ApiErrorCode::InvalidParameter,
            401 => {
                if lower.contains("expired") {
                    ApiErrorCode::TokenExpired
                } else {
                    ApiErrorCode::InvalidAccessToken
                }
            }
            403 => ApiErrorCode::InsufficientPermissions,
            404 => ApiErrorCode::ResourceNotFound,
            429 => ApiErrorCode::RateLimited,
            _ if lower.contains("rate limit") => ApiErrorCode::RateLimited,
            _ => ApiErrorCode::HttpStatus,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::serialization(e.to_string())
        } else {
            ApiError::network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::serialization(format!("JSON parse error: {}", e))
    }
}

/// A non-2xx response, normalized before it reaches the error handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    pub status: u16,
    pub status_text: String,
    /// `"HTTP <status>: <status text>"`.
    pub message: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Parsed Graph API `{"error": {...}}` envelope, when the body has one.
    pub graph_error: Option<GraphApiError>,
}

impl HttpError {
    pub fn new(status: u16, status_text: &str, url: &str, headers: Vec<(String, String)>, body: String) -> Self {
        let graph_error = serde_json::from_str::<GraphApiErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error);
        Self {
            status,
            status_text: status_text.to_string(),
            message: format!("HTTP {}: {}", status, status_text),
            url: url.to_string(),
            headers,
            body,
            graph_error,
        }
    }

    /// Body parsed as JSON, when it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Meta's error object:
/// `{ "error": { "message", "type", "code", "error_subcode", "fbtrace_id" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphApiError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<u64>,
    #[serde(default)]
    pub error_subcode: Option<u64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[derive(Deserialize)]
struct GraphApiErrorEnvelope {
    error: GraphApiError,
}

// ═══════════════════════════════════════════════════════════════════════
//  Dispatch errors
// ═══════════════════════════════════════════════════════════════════════

/// The callback slot a dispatch failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StartListening,
    MessageReceived,
    TextMessageReceived,
    StatusReceived,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartListening => "on_start_listening",
            Self::MessageReceived => "on_message_received",
            Self::TextMessageReceived => "on_text_message_received",
            Self::StatusReceived => "on_status_received",
            Self::Error => "on_error",
        };
        f.write_str(name)
    }
}

/// Why a dispatch pass stopped.
#[derive(Debug)]
pub enum DispatchError {
    /// The request body is not a webhook envelope.
    Payload(serde_json::Error),
    /// A callback returned an error; later sub-events were not dispatched.
    Callback { event: EventKind, source: BoxError },
    /// A callback panicked.
    Panicked { message: String },
}

impl DispatchError {
    pub fn callback(event: EventKind, source: BoxError) -> Self {
        Self::Callback { event, source }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(e) => write!(f, "invalid webhook payload: {}", e),
            Self::Callback { event, source } => write!(f, "{} failed: {}", event, source),
            Self::Panicked { message } => write!(f, "webhook callback panicked: {}", message),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(e) => Some(e),
            Self::Callback { source, .. } => Some(source.as_ref()),
            Self::Panicked { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e)
    }
}

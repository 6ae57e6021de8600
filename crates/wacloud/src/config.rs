//! Configuration for the webhook handlers and the REST client.
//!
//! Both structs deserialize from JSON/YAML settings with defaults for every
//! optional field, or can be read from `WA_*` environment variables.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_VERIFY_TOKEN: &str = "WA_WEBHOOK_VERIFY_TOKEN";
pub const ENV_RESPOND_IMMEDIATELY: &str = "WA_WEBHOOK_RESPOND_IMMEDIATELY";
pub const ENV_API_BASE_URL: &str = "WA_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "WA_API_TOKEN";
pub const ENV_API_TIMEOUT_SEC: &str = "WA_API_TIMEOUT_SEC";

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v21.0";

// ═══════════════════════════════════════════════════════════════════════
//  Webhook
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Verify token configured in the Meta app dashboard.
    pub verify_token: String,
    /// Acknowledge POSTs before dispatching them.
    #[serde(default)]
    pub respond_immediately: bool,
}

impl WebhookConfig {
    pub fn new(verify_token: impl Into<String>) -> Self {
        Self {
            verify_token: verify_token.into(),
            respond_immediately: false,
        }
    }

    pub fn respond_immediately(mut self, enabled: bool) -> Self {
        self.respond_immediately = enabled;
        self
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let verify_token = lookup(ENV_VERIFY_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::not_configured(format!("{} is not set", ENV_VERIFY_TOKEN)))?;
        let respond_immediately = match lookup(ENV_RESPOND_IMMEDIATELY) {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ApiError::invalid_parameter(format!("{} must be a boolean, got '{}'", ENV_RESPOND_IMMEDIATELY, v))
            })?,
            None => false,
        };
        Ok(Self {
            verify_token,
            respond_immediately,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  REST client
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestClientConfig {
    /// Prefix for every endpoint (e.g. `https://graph.facebook.com/v21.0`).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sent as `Authorization: Bearer <token>`.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_sec: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
}

fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    15
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            timeout_sec: default_timeout(),
            connect_timeout_sec: default_connect_timeout(),
        }
    }
}

impl RestClientConfig {
    /// Target the Meta Graph API at `api_version` (e.g. `"v21.0"`).
    pub fn graph(api_token: impl Into<String>, api_version: &str) -> Self {
        Self {
            base_url: Some(format!("{}/{}", GRAPH_API_BASE, api_version)),
            api_token: Some(api_token.into()),
            ..Default::default()
        }
    }

    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Self {
            base_url: lookup(ENV_API_BASE_URL).filter(|v| !v.is_empty()),
            api_token: lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()),
            ..Default::default()
        };
        if let Some(v) = lookup(ENV_API_TIMEOUT_SEC) {
            config.timeout_sec = v.trim().parse().map_err(|_| {
                ApiError::invalid_parameter(format!("{} must be a number of seconds, got '{}'", ENV_API_TIMEOUT_SEC, v))
            })?;
        }
        Ok(config)
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorCode;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_webhook_config_from_env() {
        let config = WebhookConfig::from_lookup(lookup(&[
            (ENV_VERIFY_TOKEN, "secret"),
            (ENV_RESPOND_IMMEDIATELY, "true"),
        ]))
        .unwrap();
        assert_eq!(config, WebhookConfig::new("secret").respond_immediately(true));
    }

    #[test]
    fn test_webhook_config_requires_token() {
        let err = WebhookConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::NotConfigured);
    }

    #[test]
    fn test_webhook_config_rejects_bad_bool() {
        let err = WebhookConfig::from_lookup(lookup(&[
            (ENV_VERIFY_TOKEN, "secret"),
            (ENV_RESPOND_IMMEDIATELY, "maybe"),
        ]))
        .unwrap_err();
        assert_eq!(err.code, ApiErrorCode::InvalidParameter);
    }

    #[test]
    fn test_webhook_config_deserialize_defaults() {
        let config: WebhookConfig = serde_json::from_str(r#"{"verifyToken":"abc"}"#).unwrap();
        assert!(!config.respond_immediately);
    }

    #[test]
    fn test_rest_config_defaults() {
        let config: RestClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RestClientConfig::default());
        assert_eq!(config.timeout_sec, 30);
        assert_eq!(config.connect_timeout_sec, 15);
    }

    #[test]
    fn test_rest_config_graph() {
        let config = RestClientConfig::graph("tok", DEFAULT_GRAPH_API_VERSION);
        assert_eq!(config.base_url.as_deref(), Some("https://graph.facebook.com/v21.0"));
        assert_eq!(config.api_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_rest_config_from_env() {
        let config = RestClientConfig::from_lookup(lookup(&[
            (ENV_API_BASE_URL, "http://localhost:9000"),
            (ENV_API_TOKEN, "t"),
            (ENV_API_TIMEOUT_SEC, "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.timeout_sec, 5);

        let err = RestClientConfig::from_lookup(lookup(&[(ENV_API_TIMEOUT_SEC, "soon")])).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::InvalidParameter);
    }
}

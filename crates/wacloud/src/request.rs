//! Transport-agnostic request and response shapes for the webhook endpoint.
//!
//! Whatever HTTP server hosts the webhook converts its request into a
//! [`WebhookRequest`] and writes the returned [`WebhookResponse`] back.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Method of an inbound webhook request. This is the `http` crate's type,
/// reached through reqwest's re-export.
pub use reqwest::Method;

/// A query parameter value; repeated keys collect into `Multi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// The value, if the parameter appeared exactly once.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multi(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub method: Method,
    /// Parsed JSON body; `Null` when the request had none.
    pub body: serde_json::Value,
    pub query: HashMap<String, QueryValue>,
}

impl WebhookRequest {
    /// A verification request from a raw query string (without the `?`).
    pub fn get(query_string: &str) -> Self {
        Self {
            method: Method::GET,
            body: serde_json::Value::Null,
            query: parse_query(query_string),
        }
    }

    /// A notification request carrying a decoded JSON body.
    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body,
            query: HashMap::new(),
        }
    }

    /// A notification request from raw body bytes.
    pub fn post_bytes(body: &[u8]) -> serde_json::Result<Self> {
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(body)?
        };
        Ok(Self::post(body))
    }
}

/// Group `a=1&a=2&b=3` into `{a: Multi[1, 2], b: Single(3)}`.
pub fn parse_query(query_string: &str) -> HashMap<String, QueryValue> {
    let mut query: HashMap<String, QueryValue> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
        let value = value.into_owned();
        match query.remove(&*key) {
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value));
            }
            Some(QueryValue::Single(first)) => {
                query.insert(key.into_owned(), QueryValue::Multi(vec![first, value]));
            }
            Some(QueryValue::Multi(mut values)) => {
                values.push(value);
                query.insert(key.into_owned(), QueryValue::Multi(values));
            }
        }
    }
    query
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn success() -> Self {
        Self::ok("success")
    }

    pub fn bad_request() -> Self {
        Self {
            status: 400,
            body: "Bad Request".into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: 405,
            body: "Method Not Allowed".into(),
        }
    }

    pub fn internal_error() -> Self {
        Self {
            status: 500,
            body: "Internal Server Error".into(),
        }
    }
}

//! Subscription verification handshake (`GET /webhook`).
//!
//! Meta calls the webhook URL with `hub.mode=subscribe`, the verify token
//! configured in the app dashboard, and a random `hub.challenge` that must
//! be echoed back verbatim.

use crate::request::{QueryValue, WebhookResponse};
use log::{debug, info, warn};
use std::collections::HashMap;

pub const HUB_MODE: &str = "hub.mode";
pub const HUB_VERIFY_TOKEN: &str = "hub.verify_token";
pub const HUB_CHALLENGE: &str = "hub.challenge";

const SUBSCRIBE: &str = "subscribe";

/// Answers verification challenges for a fixed verify token.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    verify_token: String,
}

impl WebhookVerifier {
    pub fn new(verify_token: impl Into<String>) -> Self {
        Self {
            verify_token: verify_token.into(),
        }
    }

    /// Echo the challenge (`200`) when mode and token match, `400` otherwise.
    pub fn verify(&self, query: &HashMap<String, QueryValue>) -> WebhookResponse {
        match self.challenge(query) {
            Some(challenge) => {
                info!("Webhook verification challenge accepted");
                WebhookResponse::ok(challenge)
            }
            None => WebhookResponse::bad_request(),
        }
    }

    fn challenge<'q>(&self, query: &'q HashMap<String, QueryValue>) -> Option<&'q str> {
        let mode = query.get(HUB_MODE).and_then(QueryValue::as_str);
        if mode != Some(SUBSCRIBE) {
            debug!("Webhook verification rejected: mode {:?}", mode);
            return None;
        }

        let token = query.get(HUB_VERIFY_TOKEN).and_then(QueryValue::as_str);
        if token != Some(self.verify_token.as_str()) {
            warn!("Webhook verification rejected: verify token mismatch");
            return None;
        }

        let challenge = query.get(HUB_CHALLENGE).and_then(QueryValue::as_str);
        if challenge.is_none() {
            warn!("Could not subscribe to the webhook: missing or repeated hub.challenge");
        }
        challenge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, QueryValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), QueryValue::Single(v.to_string())))
            .collect()
    }

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new("my_verify_token")
    }

    #[test]
    fn test_verify_challenge_ok() {
        let resp = verifier().verify(&query(&[
            ("hub.mode", "subscribe"),
            ("hub.verify_token", "my_verify_token"),
            ("hub.challenge", "challenge_123"),
        ]));
        assert_eq!(resp, WebhookResponse::ok("challenge_123"));
    }

    #[test]
    fn test_verify_challenge_bad_token() {
        let resp = verifier().verify(&query(&[
            ("hub.mode", "subscribe"),
            ("hub.verify_token", "wrong_token"),
            ("hub.challenge", "c"),
        ]));
        assert_eq!(resp, WebhookResponse::bad_request());
    }

    #[test]
    fn test_verify_challenge_bad_mode() {
        let resp = verifier().verify(&query(&[
            ("hub.mode", "unsubscribe"),
            ("hub.verify_token", "my_verify_token"),
            ("hub.challenge", "c"),
        ]));
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body, "Bad Request");
    }

    #[test]
    fn test_verify_challenge_missing() {
        let resp = verifier().verify(&query(&[
            ("hub.mode", "subscribe"),
            ("hub.verify_token", "my_verify_token"),
        ]));
        assert_eq!(resp, WebhookResponse::bad_request());
    }

    #[test]
    fn test_repeated_challenge_is_not_a_string() {
        let mut q = query(&[("hub.mode", "subscribe"), ("hub.verify_token", "my_verify_token")]);
        q.insert(
            "hub.challenge".into(),
            QueryValue::Multi(vec!["a".into(), "b".into()]),
        );
        assert_eq!(verifier().verify(&q), WebhookResponse::bad_request());
    }

    #[test]
    fn test_empty_challenge_is_echoed() {
        let resp = verifier().verify(&query(&[
            ("hub.mode", "subscribe"),
            ("hub.verify_token", "my_verify_token"),
            ("hub.challenge", ""),
        ]));
        assert_eq!(resp, WebhookResponse::ok(""));
    }
}

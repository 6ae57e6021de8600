//! Webhook request handlers.
//!
//! The handlers never fail: every problem is mapped to a status code and a
//! fixed body.

use crate::config::WebhookConfig;
use crate::dispatch::dispatch;
use crate::error::{DispatchError, EventKind};
use crate::events::WebhookEvents;
use crate::request::{Method, WebhookRequest, WebhookResponse};
use crate::types::Webhook;
use crate::verify::WebhookVerifier;
use futures::FutureExt;
use log::{debug, error};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// `GET` handler: the subscription handshake.
#[derive(Debug, Clone)]
pub struct WebhookGetHandler {
    verifier: WebhookVerifier,
}

impl WebhookGetHandler {
    pub fn new(verify_token: impl Into<String>) -> Self {
        Self {
            verifier: WebhookVerifier::new(verify_token),
        }
    }

    pub fn handle(&self, request: &WebhookRequest) -> WebhookResponse {
        self.verifier.verify(&request.query)
    }
}

/// `POST` handler: decodes the payload and dispatches it.
///
/// Any failure, including a callback panic, becomes a `500` with a fixed
/// body; the cause is only logged.
#[derive(Clone)]
pub struct WebhookPostHandler {
    events: Arc<dyn WebhookEvents>,
}

impl WebhookPostHandler {
    pub fn new(events: impl WebhookEvents + 'static) -> Self {
        Self::from_arc(Arc::new(events))
    }

    pub fn from_arc(events: Arc<dyn WebhookEvents>) -> Self {
        Self { events }
    }

    pub async fn handle(&self, request: WebhookRequest) -> WebhookResponse {
        match self.process(request.body).await {
            Ok(()) => WebhookResponse::success(),
            Err(e) => {
                error!("Webhook processing error: {}", e);
                WebhookResponse::internal_error()
            }
        }
    }

    async fn process(&self, body: serde_json::Value) -> Result<(), DispatchError> {
        let payload = Webhook::from_json_value(body)?;
        let events = self.events.as_ref();

        match AssertUnwindSafe(dispatch(&payload, events)).catch_unwind().await {
            Ok(result) => result.map(|_| ()),
            Err(panic) => Err(DispatchError::Panicked {
                message: panic_message(&*panic),
            }),
        }
    }
}

impl std::fmt::Debug for WebhookPostHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookPostHandler").finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Routes a request to the GET or POST handler by method.
///
/// With `respond_immediately`, POST requests are acknowledged with `200`
/// before dispatch runs on a spawned tokio task, for platforms that time
/// out slow webhook endpoints. Failures of such a background pass are only
/// logged.
#[derive(Clone)]
pub struct WebhookRouter {
    get: WebhookGetHandler,
    post: WebhookPostHandler,
    events: Arc<dyn WebhookEvents>,
    respond_immediately: bool,
}

impl WebhookRouter {
    pub fn new(config: &WebhookConfig, events: impl WebhookEvents + 'static) -> Self {
        Self::from_arc(config, Arc::new(events))
    }

    pub fn from_arc(config: &WebhookConfig, events: Arc<dyn WebhookEvents>) -> Self {
        Self {
            get: WebhookGetHandler::new(config.verify_token.clone()),
            post: WebhookPostHandler::from_arc(events.clone()),
            events,
            respond_immediately: config.respond_immediately,
        }
    }

    /// Fire `on_start_listening`. Hosts call this once their listener is bound.
    pub async fn start_listening(&self) -> Result<(), DispatchError> {
        self.events
            .on_start_listening()
            .await
            .map_err(|e| DispatchError::callback(EventKind::StartListening, e))
    }

    pub async fn handle(&self, request: WebhookRequest) -> WebhookResponse {
        match request.method {
            Method::GET => self.get.handle(&request),
            Method::POST if self.respond_immediately => {
                let post = self.post.clone();
                tokio::spawn(async move {
                    post.handle(request).await;
                });
                debug!("Webhook acknowledged; dispatching in background");
                WebhookResponse::success()
            }
            Method::POST => self.post.handle(request).await,
            _ => WebhookResponse::method_not_allowed(),
        }
    }
}

impl std::fmt::Debug for WebhookRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRouter")
            .field("get", &self.get)
            .field("respond_immediately", &self.respond_immediately)
            .finish_non_exhaustive()
    }
}

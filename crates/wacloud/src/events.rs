//! Callbacks fired while a webhook payload is dispatched.
//!
//! [`WebhookEvents`] is the observer interface: every method has a no-op
//! default, so implementors only override the events they care about.
//! [`EventRegistry`] implements it from optional closures for callers that
//! prefer registering callbacks one by one.

use crate::error::BoxError;
use crate::types::{TextMessage, WebhookContact, WebhookError, WebhookMessage, WebhookMetadata, WebhookStatus};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a single callback. An `Err` aborts the rest of the pass.
pub type EventResult = Result<(), BoxError>;

/// Observer for webhook events.
///
/// Each call is awaited before the next sub-event is dispatched.
#[async_trait]
pub trait WebhookEvents: Send + Sync {
    /// Fired once the hosting server is listening.
    async fn on_start_listening(&self) -> EventResult {
        Ok(())
    }

    /// Fired for every incoming message, whatever its type.
    ///
    /// `contact` is the first contact of the enclosing value, `None` when
    /// Meta sent no contacts.
    async fn on_message_received(
        &self,
        _message: &WebhookMessage,
        _contact: Option<&WebhookContact>,
        _metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        Ok(())
    }

    /// Fired after `on_message_received` for text messages with a body.
    async fn on_text_message_received(
        &self,
        _message: &TextMessage,
        _contact: Option<&WebhookContact>,
        _metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        Ok(())
    }

    /// Fired when a sent message is delivered, read, or fails.
    async fn on_status_received(
        &self,
        _status: &WebhookStatus,
        _metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        Ok(())
    }

    async fn on_error(&self, _error: &WebhookError) -> EventResult {
        Ok(())
    }
}

#[async_trait]
impl<T: WebhookEvents + ?Sized> WebhookEvents for Arc<T> {
    async fn on_start_listening(&self) -> EventResult {
        (**self).on_start_listening().await
    }

    async fn on_message_received(
        &self,
        message: &WebhookMessage,
        contact: Option<&WebhookContact>,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        (**self).on_message_received(message, contact, metadata).await
    }

    async fn on_text_message_received(
        &self,
        message: &TextMessage,
        contact: Option<&WebhookContact>,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        (**self).on_text_message_received(message, contact, metadata).await
    }

    async fn on_status_received(
        &self,
        status: &WebhookStatus,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        (**self).on_status_received(status, metadata).await
    }

    async fn on_error(&self, error: &WebhookError) -> EventResult {
        (**self).on_error(error).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Closure registry
// ═══════════════════════════════════════════════════════════════════════

type StartFn = dyn Fn() -> BoxFuture<'static, EventResult> + Send + Sync;
type MessageFn = dyn Fn(WebhookMessage, Option<WebhookContact>, Option<WebhookMetadata>) -> BoxFuture<'static, EventResult>
    + Send
    + Sync;
type TextFn = dyn Fn(TextMessage, Option<WebhookContact>, Option<WebhookMetadata>) -> BoxFuture<'static, EventResult>
    + Send
    + Sync;
type StatusFn = dyn Fn(WebhookStatus, Option<WebhookMetadata>) -> BoxFuture<'static, EventResult> + Send + Sync;
type ErrorFn = dyn Fn(WebhookError) -> BoxFuture<'static, EventResult> + Send + Sync;

/// Optional callback slots. Empty slots are skipped during dispatch.
///
/// Callbacks receive owned copies of the event data so their futures can
/// be `'static`.
///
/// ```ignore
/// let events = EventRegistry::new()
///     .with_text_message_received(|msg, contact, _meta| async move {
///         log::info!("{} says {}", contact.map(|c| c.wa_id).unwrap_or_default(), msg.body());
///         Ok(())
///     });
/// ```
#[derive(Default, Clone)]
pub struct EventRegistry {
    start_listening: Option<Arc<StartFn>>,
    message_received: Option<Arc<MessageFn>>,
    text_message_received: Option<Arc<TextFn>>,
    status_received: Option<Arc<StatusFn>>,
    error: Option<Arc<ErrorFn>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_listening<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        self.start_listening = Some(Arc::new(move || Box::pin(f()) as BoxFuture<'static, EventResult>));
        self
    }

    pub fn with_message_received<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(WebhookMessage, Option<WebhookContact>, Option<WebhookMetadata>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        self.message_received = Some(Arc::new(move |m, c, md| {
            Box::pin(f(m, c, md)) as BoxFuture<'static, EventResult>
        }));
        self
    }

    pub fn with_text_message_received<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TextMessage, Option<WebhookContact>, Option<WebhookMetadata>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        self.text_message_received = Some(Arc::new(move |m, c, md| {
            Box::pin(f(m, c, md)) as BoxFuture<'static, EventResult>
        }));
        self
    }

    pub fn with_status_received<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(WebhookStatus, Option<WebhookMetadata>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        self.status_received = Some(Arc::new(move |s, md| {
            Box::pin(f(s, md)) as BoxFuture<'static, EventResult>
        }));
        self
    }

    pub fn with_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(WebhookError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EventResult> + Send + 'static,
    {
        self.error = Some(Arc::new(move |e| Box::pin(f(e)) as BoxFuture<'static, EventResult>));
        self
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("on_start_listening", &self.start_listening.is_some())
            .field("on_message_received", &self.message_received.is_some())
            .field("on_text_message_received", &self.text_message_received.is_some())
            .field("on_status_received", &self.status_received.is_some())
            .field("on_error", &self.error.is_some())
            .finish()
    }
}

#[async_trait]
impl WebhookEvents for EventRegistry {
    async fn on_start_listening(&self) -> EventResult {
        match &self.start_listening {
            Some(f) => f().await,
            None => Ok(()),
        }
    }

    async fn on_message_received(
        &self,
        message: &WebhookMessage,
        contact: Option<&WebhookContact>,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        match &self.message_received {
            Some(f) => f(message.clone(), contact.cloned(), metadata.cloned()).await,
            None => Ok(()),
        }
    }

    async fn on_text_message_received(
        &self,
        message: &TextMessage,
        contact: Option<&WebhookContact>,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        match &self.text_message_received {
            Some(f) => f(message.clone(), contact.cloned(), metadata.cloned()).await,
            None => Ok(()),
        }
    }

    async fn on_status_received(
        &self,
        status: &WebhookStatus,
        metadata: Option<&WebhookMetadata>,
    ) -> EventResult {
        match &self.status_received {
            Some(f) => f(status.clone(), metadata.cloned()).await,
            None => Ok(()),
        }
    }

    async fn on_error(&self, error: &WebhookError) -> EventResult {
        match &self.error {
            Some(f) => f(error.clone()).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn error(code: u32) -> WebhookError {
        WebhookError {
            code,
            title: "Rate limit hit".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let events = EventRegistry::new();
        assert!(events.on_start_listening().await.is_ok());
        assert!(events.on_error(&error(130429)).await.is_ok());
    }

    #[tokio::test]
    async fn test_registered_callback_receives_owned_copy() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let events = EventRegistry::new().with_error(move |e| {
            let counter = counter.clone();
            async move {
                counter.store(e.code as usize, Ordering::SeqCst);
                Ok(())
            }
        });

        events.on_error(&error(131047)).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 131047);
    }

    #[tokio::test]
    async fn test_callback_error_is_returned() {
        let events = EventRegistry::new().with_start_listening(|| async { Err("port in use".into()) });
        let err = events.on_start_listening().await.unwrap_err();
        assert_eq!(err.to_string(), "port in use");
    }

    #[tokio::test]
    async fn test_registry_events_callable_on_concrete_type() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let events = EventRegistry::new().with_status_received(move |s, md| {
            assert_eq!(s.id, "wamid.s1");
            assert!(md.is_none());
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        let status: WebhookStatus = serde_json::from_value(serde_json::json!({ "id": "wamid.s1", "status": "sent" })).unwrap();
        let message: WebhookMessage = serde_json::from_value(serde_json::json!({ "id": "m" })).unwrap();

        events.on_status_received(&status, None).await.unwrap();
        events.on_message_received(&message, None, None).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_lists_registered_slots() {
        let events = EventRegistry::new().with_error(|_| async { Ok(()) });
        let dbg = format!("{:?}", events);
        assert!(dbg.contains("on_error: true"));
        assert!(dbg.contains("on_message_received: false"));
    }

    struct OnlyErrors(AtomicUsize);

    #[async_trait]
    impl WebhookEvents for OnlyErrors {
        async fn on_error(&self, _error: &WebhookError) -> EventResult {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_trait_defaults_and_arc_forwarding() {
        let events = Arc::new(OnlyErrors(AtomicUsize::new(0)));
        events.on_start_listening().await.unwrap();
        events.on_error(&error(1)).await.unwrap();
        assert_eq!(events.0.load(Ordering::SeqCst), 1);
    }
}

//! Webhook dispatch: walks a payload and fires callbacks in arrival order.
//!
//! For every entry, change and value, messages are dispatched first (each
//! message followed by its text event, if any), then statuses, then
//! value-level errors. Callbacks are awaited one at a time; the first
//! failure ends the pass.

use crate::error::{DispatchError, EventKind};
use crate::events::WebhookEvents;
use crate::types::{Webhook, WebhookValue};
use log::debug;

/// Callback invocations made during one successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub messages: usize,
    pub text_messages: usize,
    pub statuses: usize,
    pub errors: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.messages + self.text_messages + self.statuses + self.errors
    }
}

/// Dispatch every sub-event of `payload` to `events`.
pub async fn dispatch<E>(payload: &Webhook, events: &E) -> Result<DispatchSummary, DispatchError>
where
    E: WebhookEvents + ?Sized,
{
    let mut summary = DispatchSummary::default();

    for entry in &payload.entry {
        for change in &entry.changes {
            dispatch_value(&change.value, events, &mut summary).await?;
        }
    }

    debug!(
        "Dispatched {} webhook events ({} messages, {} text, {} statuses, {} errors)",
        summary.total(),
        summary.messages,
        summary.text_messages,
        summary.statuses,
        summary.errors
    );
    Ok(summary)
}

async fn dispatch_value<E>(
    value: &WebhookValue,
    events: &E,
    summary: &mut DispatchSummary,
) -> Result<(), DispatchError>
where
    E: WebhookEvents + ?Sized,
{
    let metadata = value.metadata.as_ref();

    for message in &value.messages {
        // Contacts are not tied to individual messages; the first one is the sender.
        let contact = value.contacts.first();

        events
            .on_message_received(message, contact, metadata)
            .await
            .map_err(|e| DispatchError::callback(EventKind::MessageReceived, e))?;
        summary.messages += 1;

        if let Some(text) = message.text_message() {
            events
                .on_text_message_received(&text, contact, metadata)
                .await
                .map_err(|e| DispatchError::callback(EventKind::TextMessageReceived, e))?;
            summary.text_messages += 1;
        }
    }

    for status in &value.statuses {
        events
            .on_status_received(status, metadata)
            .await
            .map_err(|e| DispatchError::callback(EventKind::StatusReceived, e))?;
        summary.statuses += 1;
    }

    for error in &value.errors {
        events
            .on_error(error)
            .await
            .map_err(|e| DispatchError::callback(EventKind::Error, e))?;
        summary.errors += 1;
    }

    Ok(())
}

//! Typed model of the WhatsApp Cloud API webhook payload.
//!
//! The envelope nests `entry[] -> changes[] -> value`, and each value carries
//! the receiving phone number's metadata together with any messages,
//! delivery statuses and errors. Decoding is lenient below the envelope:
//! a missing or `null` field takes its default, and a sequence item that
//! does not decode is skipped with a warning, so one bad sub-event never
//! costs the rest of the delivery.

use chrono::{DateTime, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
//  Envelope
// ═══════════════════════════════════════════════════════════════════════

/// Top-level incoming webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Webhook {
    #[serde(default, deserialize_with = "null_as_default")]
    pub object: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub entry: Vec<WebhookEntry>,
}

impl Webhook {
    /// Decode a raw JSON request body. A `null` body is an empty envelope.
    pub fn from_json_value(body: serde_json::Value) -> serde_json::Result<Self> {
        if body.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookChange {
    /// Subscription field, `"messages"` for everything dispatched here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(default, deserialize_with = "lenient")]
    pub value: WebhookValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messaging_product: String,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WebhookMetadata>,
    /// Only present alongside `messages`; index 0 is the sender of all of them.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub contacts: Vec<WebhookContact>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub messages: Vec<WebhookMessage>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub statuses: Vec<WebhookStatus>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub errors: Vec<WebhookError>,
}

/// Identity of the business phone number that received the webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_phone_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number_id: String,
}

/// The customer who sent a message to the business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContact {
    /// The customer's WhatsApp ID. Replies can be addressed to it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub wa_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: WebhookProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════

/// Error descriptor reported at value level, inside a message, or on a status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<WebhookErrorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookErrorData {
    #[serde(default)]
    pub details: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Messages
// ═══════════════════════════════════════════════════════════════════════

/// Discriminator of an incoming message.
///
/// Types this crate does not know about decode as [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebhookMessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Sticker,
    Location,
    Contacts,
    Interactive,
    Button,
    Order,
    System,
    Reaction,
    RequestWelcome,
    #[default]
    Unknown,
}

impl WebhookMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Document => "document",
            Self::Sticker => "sticker",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Interactive => "interactive",
            Self::Button => "button",
            Self::Order => "order",
            Self::System => "system",
            Self::Reaction => "reaction",
            Self::RequestWelcome => "request_welcome",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for WebhookMessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "audio" | "voice" => Self::Audio,
            "video" => Self::Video,
            "document" => Self::Document,
            "sticker" => Self::Sticker,
            "location" => Self::Location,
            "contacts" | "contact" => Self::Contacts,
            "interactive" => Self::Interactive,
            "button" => Self::Button,
            "order" => Self::Order,
            "system" => Self::System,
            "reaction" => Self::Reaction,
            "request_welcome" => Self::RequestWelcome,
            _ => Self::Unknown,
        }
    }
}

impl From<WebhookMessageType> for String {
    fn from(t: WebhookMessageType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for WebhookMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming WhatsApp message.
///
/// Payload fields are populated according to [`msg_type`](Self::msg_type);
/// see <https://developers.facebook.com/docs/whatsapp/cloud-api/webhooks/components#messages-object>.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookMessage {
    /// Message ID, usable to mark the message as read.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Sender's WhatsApp ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: String,
    /// Unix seconds, as sent by Meta.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub msg_type: WebhookMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<WebhookText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<WebhookMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<WebhookMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<WebhookMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<WebhookAudio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<WebhookSticker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<WebhookLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<WebhookContactCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<WebhookInteractive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<WebhookButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<WebhookOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<WebhookSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<WebhookReaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<WebhookContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<WebhookReferral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<WebhookIdentity>,
    /// Set when the message type is not supported by the Cloud API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<WebhookError>>,
}

impl WebhookMessage {
    pub fn is_text(&self) -> bool {
        self.msg_type == WebhookMessageType::Text
    }

    /// Reduced view handed to text callbacks; `None` unless this is a text
    /// message carrying a body.
    pub fn text_message(&self) -> Option<TextMessage> {
        if !self.is_text() {
            return None;
        }
        self.text.as_ref().map(|text| TextMessage {
            id: self.id.clone(),
            msg_type: self.msg_type,
            text: text.clone(),
            from: self.from.clone(),
            timestamp: self.timestamp.clone(),
        })
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_unix_timestamp(&self.timestamp)
    }
}

/// The subset of a text message passed to `on_text_message_received`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TextMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub msg_type: WebhookMessageType,
    pub text: WebhookText,
    pub from: String,
    pub timestamp: String,
}

impl TextMessage {
    pub fn body(&self) -> &str {
        &self.text.body
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookText {
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
}

/// Image, video or document attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookMedia {
    pub id: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Name of the file on the sender's device (documents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookAudio {
    pub id: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookSticker {
    pub id: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookLocation {
    #[serde(deserialize_with = "number_or_string")]
    pub latitude: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ─── Shared contact cards ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactCard {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<WebhookContactAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<WebhookContactEmail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<WebhookContactName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<WebhookContactOrg>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<WebhookContactPhone>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<WebhookContactUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactAddress {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactEmail {
    pub email: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactName {
    pub formatted_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub suffix: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactOrg {
    pub company: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactPhone {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContactUrl {
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub url_type: Option<String>,
}

// ─── Interactive replies ────────────────────────────────────────────

/// Reply to an interactive message (button, list or flow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookInteractive {
    #[serde(rename = "type")]
    pub reply_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_reply: Option<WebhookButtonReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_reply: Option<WebhookListReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfm_reply: Option<WebhookNfmReply>,
}

impl WebhookInteractive {
    /// ID of the selected button or list row.
    pub fn reply_id(&self) -> Option<&str> {
        self.button_reply
            .as_ref()
            .map(|b| b.id.as_str())
            .or_else(|| self.list_reply.as_ref().map(|l| l.id.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookButtonReply {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookListReply {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Flow submission ("native flow message" reply).
///
/// `name` is `"flow"` for general flows and `"address_message"` for address
/// collection; `response_json` is the submitted form, still JSON-encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookNfmReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub response_json: String,
}

impl WebhookNfmReply {
    pub fn response(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.response_json)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookButton {
    pub payload: String,
    pub text: String,
}

// ─── Orders, system, reactions ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookOrder {
    pub catalog_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub product_items: Vec<WebhookProductItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookProductItem {
    pub product_retailer_id: String,
    #[serde(deserialize_with = "number_or_string")]
    pub quantity: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub item_price: f64,
    pub currency: String,
}

/// Customer changed their phone number or profile information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookSystem {
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Webhook versions v11 and below.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_wa_id: Option<String>,
    /// Webhook versions v12 and above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookReaction {
    pub message_id: String,
    /// Empty when the reaction was removed.
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookContext {
    #[serde(default)]
    pub forwarded: bool,
    #[serde(default)]
    pub frequently_forwarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// ID of the business message being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_product: Option<WebhookReferredProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookReferredProduct {
    pub catalog_id: String,
    pub product_retailer_id: String,
}

/// Click-to-WhatsApp ad or post the customer came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookReferral {
    pub source_url: Option<String>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub headline: Option<String>,
    pub body: Option<String>,
    pub media_type: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub ctwa_clid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookIdentity {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub created_timestamp: String,
    #[serde(default)]
    pub hash: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Statuses
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebhookStatusKind {
    Sent,
    Delivered,
    Read,
    Failed,
    #[default]
    Unknown,
}

impl WebhookStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for WebhookStatusKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sent" => Self::Sent,
            "delivered" => Self::Delivered,
            "read" => Self::Read,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl From<WebhookStatusKind> for String {
    fn from(k: WebhookStatusKind) -> Self {
        k.as_str().to_string()
    }
}

/// Sent/delivered/read/failed notification for a message the business sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: WebhookStatusKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_opaque_callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<WebhookConversation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<WebhookPricing>,
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WebhookError>,
}

impl WebhookStatus {
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_unix_timestamp(&self.timestamp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookConversation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<WebhookConversationOrigin>,
    /// Only present when the status is `sent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookConversationOrigin {
    #[serde(rename = "type")]
    pub origin_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebhookPricing {
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub pricing_model: String,
    #[serde(default)]
    pub category: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════

fn parse_unix_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    ts.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// `null` decodes as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A sequence of sub-events. `null` or a non-array is empty; items that do
/// not decode are dropped.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(items)) => items,
        None => return Ok(Vec::new()),
        Some(other) => {
            warn!("Ignoring webhook field: expected an array, got {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed webhook item: {}", e);
                None
            }
        })
        .collect())
}

/// A nested object that falls back to its default when it does not decode.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient_opt(deserializer)?.unwrap_or_default())
}

fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => match serde_json::from_value(raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("Ignoring malformed webhook object: {}", e);
                Ok(None)
            }
        },
    }
}

/// Meta is inconsistent about quoting numbers; accept both forms.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        String(String),
    }

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

//! # wacloud – WhatsApp Cloud API webhooks and REST client
//!
//! Webhook ingestion for the WhatsApp Business Platform plus a minimal
//! bearer-authenticated client for the Meta Graph API.
//!
//! ## Features
//!
//! - **Verification** – answers the `hub.mode=subscribe` handshake
//! - **Dispatch** – walks `entry -> changes -> value` and fires message,
//!   text, status and error callbacks strictly in payload order
//! - **Handlers** – transport-agnostic GET/POST adapters and a router with
//!   an acknowledge-first mode
//! - **REST client** – `get`/`post`/`put`/`delete` with a pluggable handler
//!   for non-2xx responses

pub mod types;
pub mod request;
pub mod error;
pub mod config;
pub mod events;
pub mod verify;
pub mod dispatch;
pub mod handlers;
pub mod client;

pub use client::{ErrorHandler, RawBody, RequestOptions, ResponseType, RestClient};
pub use config::{RestClientConfig, WebhookConfig};
pub use dispatch::{dispatch, DispatchSummary};
pub use error::{ApiError, ApiErrorCode, ApiResult, BoxError, DispatchError, EventKind, HttpError};
pub use events::{EventRegistry, EventResult, WebhookEvents};
pub use handlers::{WebhookGetHandler, WebhookPostHandler, WebhookRouter};
pub use request::{Method, QueryValue, WebhookRequest, WebhookResponse};
pub use types::*;
pub use verify::WebhookVerifier;

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wacloud::{
    EventRegistry, TextMessage, WebhookConfig, WebhookContact, WebhookError, WebhookMessage, WebhookMetadata,
    WebhookRequest, WebhookResponse, WebhookRouter, WebhookStatus,
};

const TOKEN: &str = "test-token";

/// One value with two messages (one text), two statuses and two errors.
fn webhook_body() -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550783881",
                        "phone_number_id": "106540352242922"
                    },
                    "contacts": [{ "profile": { "name": "Sheena Nelson" }, "wa_id": "16505551234" }],
                    "messages": [
                        {
                            "from": "16505551234",
                            "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                            "timestamp": "1749416383",
                            "type": "text",
                            "text": { "body": "Does it come in another color?" }
                        },
                        {
                            "from": "16505551234",
                            "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgB=",
                            "timestamp": "1749416390",
                            "type": "location",
                            "location": { "latitude": 37.483307, "longitude": -122.148981, "name": "Pablo Morales" }
                        }
                    ],
                    "statuses": [
                        {
                            "id": "wamid.status1",
                            "status": "sent",
                            "timestamp": "1749416400",
                            "recipient_id": "16505551234",
                            "pricing": { "billable": true, "pricing_model": "CBP", "category": "service" }
                        },
                        {
                            "id": "wamid.status2",
                            "status": "failed",
                            "timestamp": "1749416401",
                            "recipient_id": "16505551234",
                            "errors": [{ "code": 131026, "title": "Message undeliverable" }]
                        }
                    ],
                    "errors": [
                        { "code": 130429, "title": "Rate limit hit", "message": "Rate limit hit",
                          "error_data": { "details": "Message failed to send because there were too many messages sent from this phone number in a short period of time" } },
                        { "code": 131000, "title": "Something went wrong" }
                    ]
                }
            }]
        }]
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Message(WebhookMessage, Option<WebhookContact>, Option<WebhookMetadata>),
    Text(TextMessage, Option<WebhookContact>, Option<WebhookMetadata>),
    Status(WebhookStatus, Option<WebhookMetadata>),
    Error(WebhookError),
}

fn recording_registry(calls: Arc<Mutex<Vec<Call>>>) -> EventRegistry {
    let (c1, c2, c3, c4) = (calls.clone(), calls.clone(), calls.clone(), calls);
    EventRegistry::new()
        .with_message_received(move |m, c, md| {
            c1.lock().unwrap().push(Call::Message(m, c, md));
            async { Ok(()) }
        })
        .with_text_message_received(move |m, c, md| {
            c2.lock().unwrap().push(Call::Text(m, c, md));
            async { Ok(()) }
        })
        .with_status_received(move |s, md| {
            c3.lock().unwrap().push(Call::Status(s, md));
            async { Ok(()) }
        })
        .with_error(move |e| {
            c4.lock().unwrap().push(Call::Error(e));
            async { Ok(()) }
        })
}

fn router(calls: Arc<Mutex<Vec<Call>>>) -> WebhookRouter {
    WebhookRouter::new(&WebhookConfig::new(TOKEN), recording_registry(calls))
}

#[tokio::test]
async fn test_get_subscribes_with_matching_token() {
    let router = router(Arc::default());
    let resp = router
        .handle(WebhookRequest::get(
            "hub.mode=subscribe&hub.verify_token=test-token&hub.challenge=CHALLENGE",
        ))
        .await;
    assert_eq!(resp, WebhookResponse { status: 200, body: "CHALLENGE".into() });
}

#[tokio::test]
async fn test_get_rejects_mismatched_token() {
    let router = router(Arc::default());
    let resp = router
        .handle(WebhookRequest::get(
            "hub.mode=subscribe&hub.verify_token=other&hub.challenge=CHALLENGE",
        ))
        .await;
    assert_eq!(resp, WebhookResponse { status: 400, body: "Bad Request".into() });
}

#[tokio::test]
async fn test_post_empty_entry_invokes_nothing() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let router = router(calls.clone());

    let resp = router.handle(WebhookRequest::post(json!({ "entry": [] }))).await;
    assert_eq!(resp, WebhookResponse { status: 200, body: "success".into() });
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_fires_events_in_payload_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let router = router(calls.clone());

    let body = webhook_body();
    let resp = router.handle(WebhookRequest::post(body.clone())).await;
    assert_eq!(resp, WebhookResponse::success());

    let value = &body["entry"][0]["changes"][0]["value"];
    let contact: WebhookContact = serde_json::from_value(value["contacts"][0].clone()).unwrap();
    let metadata: WebhookMetadata = serde_json::from_value(value["metadata"].clone()).unwrap();
    let message = |i: usize| -> WebhookMessage { serde_json::from_value(value["messages"][i].clone()).unwrap() };
    let status = |i: usize| -> WebhookStatus { serde_json::from_value(value["statuses"][i].clone()).unwrap() };
    let error = |i: usize| -> WebhookError { serde_json::from_value(value["errors"][i].clone()).unwrap() };
    let text: TextMessage = serde_json::from_value(json!({
        "id": value["messages"][0]["id"],
        "type": "text",
        "text": { "body": "Does it come in another color?" },
        "from": "16505551234",
        "timestamp": "1749416383"
    }))
    .unwrap();

    let expected = vec![
        Call::Message(message(0), Some(contact.clone()), Some(metadata.clone())),
        Call::Text(text, Some(contact.clone()), Some(metadata.clone())),
        Call::Message(message(1), Some(contact), Some(metadata.clone())),
        Call::Status(status(0), Some(metadata.clone())),
        Call::Status(status(1), Some(metadata)),
        Call::Error(error(0)),
        Call::Error(error(1)),
    ];
    assert_eq!(*calls.lock().unwrap(), expected);
}

#[tokio::test]
async fn test_post_null_entry_is_acknowledged() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let router = router(calls.clone());

    let resp = router.handle(WebhookRequest::post(json!({ "entry": null }))).await;
    assert_eq!(resp, WebhookResponse::success());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_partial_value_still_dispatches_valid_events() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let router = router(calls.clone());

    let body = json!({
        "object": "whatsapp_business_account",
        "entry": [{ "id": "102290129340398", "changes": [{ "field": "messages", "value": {
            "metadata": null,
            "contacts": null,
            "statuses": null,
            "messages": [
                { "from": "16505551234", "id": "wamid.first", "timestamp": "1749416383", "type": "image",
                  "image": { "id": "media-1", "mime_type": "image/jpeg" } },
                { "from": "16505551234", "id": "wamid.second", "type": "text", "text": { "body": "late" } }
            ],
            "errors": [{ "code": 131000, "title": "Something went wrong" }]
        } }] }]
    });

    let resp = router.handle(WebhookRequest::post(body)).await;
    assert_eq!(resp, WebhookResponse::success());

    let recorded = calls.lock().unwrap().clone();
    assert_eq!(recorded.len(), 4);
    assert!(matches!(&recorded[0], Call::Message(m, None, None) if m.id == "wamid.first"));
    assert!(matches!(&recorded[1], Call::Message(m, None, None) if m.id == "wamid.second" && m.timestamp.is_empty()));
    assert!(matches!(&recorded[2], Call::Text(t, None, None) if t.body() == "late"));
    assert!(matches!(&recorded[3], Call::Error(e) if e.code == 131000));
}

#[tokio::test]
async fn test_same_payload_twice_dispatches_twice() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let router = router(calls.clone());

    router.handle(WebhookRequest::post(webhook_body())).await;
    let first: Vec<Call> = calls.lock().unwrap().clone();
    router.handle(WebhookRequest::post(webhook_body())).await;

    let all = calls.lock().unwrap().clone();
    assert_eq!(all.len(), 14);
    assert_eq!(&all[..7], &first[..]);
    assert_eq!(&all[7..], &first[..]);
}

#[tokio::test]
async fn test_post_callback_failure_is_internal_error() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let events = EventRegistry::new()
        .with_status_received(move |s, _| {
            log.lock().unwrap().push(s.id.clone());
            async move {
                if s.id == "wamid.status1" {
                    Err("status store unavailable".into())
                } else {
                    Ok(())
                }
            }
        })
        .with_error(|_| async { panic!("errors must not be dispatched after a failure") });
    let router = WebhookRouter::new(&WebhookConfig::new(TOKEN), events);

    let resp = router.handle(WebhookRequest::post(webhook_body())).await;
    assert_eq!(resp, WebhookResponse { status: 500, body: "Internal Server Error".into() });
    assert_eq!(*seen.lock().unwrap(), vec!["wamid.status1".to_string()]);
}

#[tokio::test]
async fn test_respond_immediately_acknowledges_before_dispatch() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let release = Arc::new(tokio::sync::Notify::new());
    let gate = release.clone();
    let events = EventRegistry::new().with_message_received(move |m, _, _| {
        let tx = tx.clone();
        let gate = gate.clone();
        async move {
            gate.notified().await;
            tx.send(m.id).ok();
            Ok(())
        }
    });
    let router = WebhookRouter::new(&WebhookConfig::new(TOKEN).respond_immediately(true), events);

    let resp = router.handle(WebhookRequest::post(webhook_body())).await;
    assert_eq!(resp, WebhookResponse::success());
    assert!(rx.try_recv().is_err());

    release.notify_one();
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(first.unwrap().ends_with("RgA="));
    release.notify_one();
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(second.unwrap().ends_with("RgB="));
}

#[tokio::test]
async fn test_start_listening() {
    let started = Arc::new(Mutex::new(0));
    let counter = started.clone();
    let events = EventRegistry::new().with_start_listening(move || {
        *counter.lock().unwrap() += 1;
        async { Ok(()) }
    });
    let router = WebhookRouter::new(&WebhookConfig::new(TOKEN), events);

    router.start_listening().await.unwrap();
    assert_eq!(*started.lock().unwrap(), 1);
}

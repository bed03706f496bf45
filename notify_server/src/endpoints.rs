//! Endpoints of HTTP server.
//!
use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse,
    },
    Extension,
};
use bytes::Bytes;
use common::protocol::{MSG_MISSING, MSG_RECEIVED, OBJECT_DETECTED_EVENT};
use futures::StreamExt;
use serde_json::Value;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::pubsub::{EventPubSub, RelayedMsg};

/// Live dashboard subscribing to `/events`.
const DASHBOARD_HTML: &str = include_str!("../resources/index.html");

/// Push clients may live on any origin.
const ALLOW_ANY_ORIGIN: [(header::HeaderName, &str); 1] =
    [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")];

/// Health check endpoint.
pub async fn healthcheck() -> &'static str {
    "healthy"
}

/// Dashboard page.
pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Ingestion endpoint, re-broadcasts the `message` of a JSON object body.
///
/// The value of `message` is relayed as is, whatever its JSON type. Bodies that are not a JSON
/// object with a `message` key are rejected with `400` and nothing is emitted.
pub async fn upload(
    Extension(pubsub): Extension<Arc<EventPubSub>>,
    body: Bytes,
) -> impl IntoResponse {
    match extract_message(&body) {
        Ok(message) => {
            log::info!("Broadcasting {}", message);
            let receivers = pubsub.publish(RelayedMsg::new(message));
            log::debug!("Reached {} client(s)", receivers);
            (StatusCode::OK, ALLOW_ANY_ORIGIN, MSG_RECEIVED)
        }
        Err(reason) => {
            log::warn!("Rejecting upload body ({} bytes): {}", body.len(), reason);
            (StatusCode::BAD_REQUEST, ALLOW_ANY_ORIGIN, MSG_MISSING)
        }
    }
}

/// Take the `message` field out of an upload body.
pub fn extract_message(body: &[u8]) -> Result<Value, String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => fields
            .remove("message")
            .ok_or_else(|| "no message field".to_owned()),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(e.to_string()),
    }
}

/// Server-sent event stream of detections.
pub async fn events(Extension(pubsub): Extension<Arc<EventPubSub>>) -> impl IntoResponse {
    let rx = pubsub.subscribe();
    log::info!("Event stream opened ({} subscriber(s))", pubsub.subscriber_count());

    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(msg) => Some(as_sse_event(&msg)),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                log::warn!("Event subscriber lagging, skipped {} event(s)", skipped);
                None
            }
        }
    });

    (
        ALLOW_ANY_ORIGIN,
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}

/// Wrap a detection as named push event.
pub fn as_sse_event(msg: &RelayedMsg) -> Result<Event, serde_json::Error> {
    Event::default().event(OBJECT_DETECTED_EVENT).json_data(msg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dashboard_listens_for_detections() {
        assert!(DASHBOARD_HTML.contains("/events"));
        assert!(DASHBOARD_HTML.contains(OBJECT_DETECTED_EVENT));
    }

    #[test]
    fn test_message_of_any_type_is_extracted() {
        assert_eq!(
            extract_message(r#"{"message": "Se detectó: Vaca"}"#.as_bytes()),
            Ok(Value::from("Se detectó: Vaca"))
        );
        assert_eq!(extract_message(br#"{"message": ""}"#), Ok(Value::from("")));
        assert_eq!(extract_message(br#"{"message": null}"#), Ok(Value::Null));
        assert_eq!(extract_message(br#"{"message": 3}"#), Ok(Value::from(3)));
        assert_eq!(
            extract_message(br#"{"message": "hola", "id": 7}"#),
            Ok(Value::from("hola"))
        );
    }

    #[test]
    fn test_bodies_without_message_field() {
        for body in ["{}", "", "not json", r#"{"msg": "x"}"#, r#"["message"]"#, "3"] {
            assert!(extract_message(body.as_bytes()).is_err(), "body {body:?}");
        }
    }

    #[test]
    fn test_sse_event_from_detection() {
        let msg = RelayedMsg::new(Value::from("Se detectó: Vaca"));
        assert!(as_sse_event(&msg).is_ok());

        let msg = RelayedMsg::new(Value::Null);
        assert!(as_sse_event(&msg).is_ok());
    }
}

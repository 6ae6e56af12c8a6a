//! Server-Sent Events support

use crate::runtime::{ChatEvent, ChatSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with the current snapshot
pub fn sse_stream(
    init: ChatSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<ChatEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(init_event(&init)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(chat_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_event(snapshot: &ChatSnapshot) -> Event {
    let data = json!({
        "type": "init",
        "conversation_id": snapshot.conversation_id,
        "messages": snapshot.messages,
        "titles": snapshot.titles,
        "state": snapshot.state,
        "busy": snapshot.busy,
    });
    Event::default().event("init").data(data.to_string())
}

fn chat_event_to_axum(event: ChatEvent) -> Event {
    let (event_type, data) = match event {
        ChatEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        ChatEvent::Reset { messages } => (
            "reset",
            json!({
                "type": "reset",
                "messages": messages
            }),
        ),
        ChatEvent::Titles { titles } => (
            "titles",
            json!({
                "type": "titles",
                "titles": titles
            }),
        ),
        ChatEvent::StateChange { state, busy } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state,
                "busy": busy
            }),
        ),
        ChatEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}

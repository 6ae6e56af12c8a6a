//! Conversation runtime executor

use super::{ChatEvent, ChatSnapshot, Envelope};
use crate::conversation::{new_message_id, Message, TitleList, Transcript};
use crate::responder::{ResponseError, ResponseSource};
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Conversation runtime, generic over the response source
pub struct ChatRuntime<R>
where
    R: ResponseSource + 'static,
{
    context: ChatContext,
    state: ChatState,
    transcript: Transcript,
    titles: TitleList,
    responder: Arc<R>,
    response_timeout: Duration,
    event_rx: mpsc::Receiver<Envelope>,
    event_tx: mpsc::Sender<Envelope>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    /// Token to cancel the running response request
    response_cancel_token: Option<CancellationToken>,
}

impl<R> ChatRuntime<R>
where
    R: ResponseSource + 'static,
{
    pub fn new(
        context: ChatContext,
        titles: TitleList,
        responder: R,
        response_timeout: Duration,
        event_rx: mpsc::Receiver<Envelope>,
        event_tx: mpsc::Sender<Envelope>,
        broadcast_tx: broadcast::Sender<ChatEvent>,
    ) -> Self {
        let state = ChatState::Idle;
        let transcript = Transcript::new();
        let (snapshot_tx, _) =
            watch::channel(build_snapshot(&context, &state, &transcript, &titles));
        Self {
            context,
            state,
            transcript,
            titles,
            responder: Arc::new(responder),
            response_timeout,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            response_cancel_token: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.context.conversation_id
    }

    /// Receiver for snapshots published after every processed event
    pub fn watch(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.context.conversation_id, "Starting conversation runtime");

        while let Some(Envelope { event, ack }) = self.event_rx.recv().await {
            let outcome = self.process_event(event);
            if let Some(ack) = ack {
                // The caller may have gone away; the transition stands either way
                let _ = ack.send(outcome);
            }
        }

        if let Some(token) = self.response_cancel_token.take() {
            token.cancel();
        }
        tracing::info!(conv_id = %self.context.conversation_id, "Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        let settles_request = matches!(
            event,
            Event::ResponseReady { .. } | Event::ResponseFailed { .. }
        );

        // Pure state transition
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) if e.is_silent() => {
                tracing::debug!(event = event_name, reason = %e, "Ignoring event");
                return Err(e);
            }
            Err(e) => {
                // Transition errors are user-facing (e.g. "assistant is busy")
                tracing::warn!(event = event_name, error = %e, "Event rejected");
                let _ = self.broadcast_tx.send(ChatEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        if settles_request {
            self.response_cancel_token = None;
        }

        tracing::debug!(
            event = event_name,
            from = self.state.name(),
            to = result.new_state.name(),
            "State transition"
        );
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.publish_snapshot();
        Ok(())
    }

    /// Execute an effect against the owned state
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { id, role, content } => {
                if let Some(message) = self.transcript.push(Message::new(id, role, content)) {
                    let _ = self.broadcast_tx.send(ChatEvent::Message {
                        message: message.clone(),
                    });
                }
            }

            Effect::RequestResponse { request_id, text } => {
                self.request_response(request_id, text);
            }

            Effect::AbortResponse => {
                if let Some(token) = self.response_cancel_token.take() {
                    tracing::info!("Aborting in-flight response request");
                    token.cancel();
                }
            }

            Effect::ResetTranscript => {
                self.transcript.reset();
                let _ = self.broadcast_tx.send(ChatEvent::Reset {
                    messages: self.transcript.messages().to_vec(),
                });
            }

            Effect::PrependTitle { title } => {
                self.titles.prepend(title);
                let _ = self.broadcast_tx.send(ChatEvent::Titles {
                    titles: self.titles.titles().to_vec(),
                });
            }

            Effect::NotifyError { message } => {
                let _ = self.broadcast_tx.send(ChatEvent::Error { message });
            }

            Effect::PublishState => {
                let _ = self.broadcast_tx.send(ChatEvent::StateChange {
                    state: self.state.clone(),
                    busy: self.state.is_busy(),
                });
            }
        }
    }

    /// Spawn the response request as a background task.
    ///
    /// The outcome comes back through the event channel; a cancelled
    /// request sends nothing.
    fn request_response(&mut self, request_id: String, text: String) {
        let cancel_token = CancellationToken::new();
        if let Some(previous) = self.response_cancel_token.replace(cancel_token.clone()) {
            previous.cancel();
        }

        let responder = self.responder.clone();
        let event_tx = self.event_tx.clone();
        let response_timeout = self.response_timeout;

        tokio::spawn(async move {
            tracing::info!(
                request_id = %request_id,
                source = responder.name(),
                "Requesting response (background)"
            );

            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::info!(request_id = %request_id, "Response request cancelled");
                }

                result = tokio::time::timeout(response_timeout, responder.respond(&text)) => {
                    let outcome = result.unwrap_or_else(|_| {
                        Err(ResponseError::timeout(format!(
                            "No reply within {}ms",
                            response_timeout.as_millis()
                        )))
                    });
                    let reply_id = new_message_id();
                    let event = match outcome {
                        Ok(text) => Event::ResponseReady { request_id, reply_id, text },
                        Err(e) => Event::ResponseFailed {
                            request_id,
                            reply_id,
                            message: e.message,
                            kind: e.kind,
                        },
                    };
                    let _ = event_tx.send(Envelope::new(event)).await;
                }
            }
        });
    }

    fn publish_snapshot(&self) {
        let snapshot = build_snapshot(&self.context, &self.state, &self.transcript, &self.titles);
        self.snapshot_tx.send_replace(snapshot);
    }

    #[cfg(test)]
    pub(crate) fn role_sequence(&self) -> Vec<crate::conversation::Role> {
        self.transcript.messages().iter().map(|m| m.role).collect()
    }
}

fn build_snapshot(
    context: &ChatContext,
    state: &ChatState,
    transcript: &Transcript,
    titles: &TitleList,
) -> ChatSnapshot {
    ChatSnapshot {
        conversation_id: context.conversation_id.clone(),
        messages: transcript.messages().to_vec(),
        titles: titles.titles().to_vec(),
        state: state.clone(),
        busy: state.is_busy(),
    }
}

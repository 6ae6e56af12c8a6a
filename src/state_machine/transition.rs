//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event, ResetPolicy};
use crate::conversation::DEFAULT_TITLE;
use crate::responder::ResponseErrorKind;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Assistant is still responding, wait for the reply first")]
    Busy,
    #[error("Discarding reply for request {request_id} that is no longer pending")]
    StaleResponse { request_id: String },
}

impl TransitionError {
    /// Silent errors are dropped without telling observers
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::StaleResponse { .. })
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Message ids arrive on events; timestamps are stamped by the runtime.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User Message Handling
        // ============================================================

        (ChatState::Idle, Event::UserMessage { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        (ChatState::Idle, Event::UserMessage { message_id, text }) => Ok(TransitionResult::new(
            ChatState::AwaitingResponse {
                request_id: message_id.clone(),
            },
        )
        .with_effect(Effect::user_message(message_id.clone(), text.clone()))
        .with_effect(Effect::PublishState)
        .with_effect(Effect::RequestResponse {
            request_id: message_id,
            text,
        })),

        (ChatState::AwaitingResponse { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::Busy)
        }

        // ============================================================
        // Response Handling
        // ============================================================

        (
            ChatState::AwaitingResponse { request_id },
            Event::ResponseReady {
                request_id: reply_to,
                reply_id,
                text,
            },
        ) if *request_id == reply_to => Ok(TransitionResult::new(ChatState::Idle)
            .with_effect(Effect::assistant_message(reply_id, text))
            .with_effect(Effect::PublishState)),

        (
            ChatState::AwaitingResponse { request_id },
            Event::ResponseFailed {
                request_id: reply_to,
                reply_id,
                message,
                kind,
            },
        ) if *request_id == reply_to => Ok(TransitionResult::new(ChatState::Idle)
            .with_effect(Effect::assistant_message(reply_id, error_turn_text(kind)))
            .with_effect(Effect::NotifyError { message })
            .with_effect(Effect::PublishState)),

        (_, Event::ResponseReady { request_id, .. } | Event::ResponseFailed { request_id, .. }) => {
            Err(TransitionError::StaleResponse { request_id })
        }

        // ============================================================
        // Reset / New Conversation
        // ============================================================

        (ChatState::Idle, Event::Reset) => Ok(reset_result(false)),

        (ChatState::Idle, Event::NewConversation) => Ok(reset_result(true)),

        (ChatState::AwaitingResponse { .. }, Event::Reset | Event::NewConversation)
            if context.reset_policy == ResetPolicy::Reject =>
        {
            Err(TransitionError::Busy)
        }

        (ChatState::AwaitingResponse { .. }, event @ (Event::Reset | Event::NewConversation)) => {
            let new_title = matches!(event, Event::NewConversation);
            let reset = reset_result(new_title);
            Ok(TransitionResult::new(reset.new_state)
                .with_effect(Effect::AbortResponse)
                .with_effects(reset.effects))
        }
    }
}

fn reset_result(new_title: bool) -> TransitionResult {
    let mut result = TransitionResult::new(ChatState::Idle).with_effect(Effect::ResetTranscript);
    if new_title {
        result = result.with_effect(Effect::PrependTitle {
            title: DEFAULT_TITLE.to_string(),
        });
    }
    result.with_effect(Effect::PublishState)
}

/// Assistant-visible text for a failed reply
pub fn error_turn_text(kind: ResponseErrorKind) -> String {
    format!("{} Please try again.", kind.describe())
}

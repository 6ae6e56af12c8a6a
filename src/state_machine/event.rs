//! Events that can occur in a conversation

use crate::responder::ResponseErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        /// Id for the user turn, minted by the caller
        message_id: String,
        text: String,
    },
    Reset,
    NewConversation,

    // Responder events
    ResponseReady {
        request_id: String,
        reply_id: String,
        text: String,
    },
    ResponseFailed {
        request_id: String,
        reply_id: String,
        message: String,
        kind: ResponseErrorKind,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::Reset => "reset",
            Event::NewConversation => "new_conversation",
            Event::ResponseReady { .. } => "response_ready",
            Event::ResponseFailed { .. } => "response_failed",
        }
    }
}

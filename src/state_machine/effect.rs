//! Effects produced by state transitions

use crate::conversation::Role;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a turn to the transcript (timestamp stamped on execution)
    AppendMessage {
        id: String,
        role: Role,
        content: String,
    },

    /// Ask the response source for a reply
    RequestResponse { request_id: String, text: String },

    /// Abort the in-flight response request
    AbortResponse,

    /// Replace the transcript with a fresh welcome turn
    ResetTranscript,

    /// Insert a title at the head of the title list
    PrependTitle { title: String },

    /// Tell observers something went wrong
    NotifyError { message: String },

    /// Broadcast the new state to observers
    PublishState,
}

impl Effect {
    pub fn user_message(id: impl Into<String>, content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            id: id.into(),
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant_message(id: impl Into<String>, content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            id: id.into(),
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

//! Conversation state types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Conversation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Ready for user input, no pending reply
    #[default]
    Idle,

    /// User turn appended, reply requested and not yet delivered
    AwaitingResponse {
        /// Id of the user message that triggered the request
        request_id: String,
    },
}

impl ChatState {
    /// Busy flag: true while a reply is pending
    pub fn is_busy(&self) -> bool {
        matches!(self, ChatState::AwaitingResponse { .. })
    }

    /// Id of the pending request, if any
    #[allow(dead_code)] // State query utility
    pub fn pending_request(&self) -> Option<&str> {
        match self {
            ChatState::Idle => None,
            ChatState::AwaitingResponse { request_id } => Some(request_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::AwaitingResponse { .. } => "awaiting_response",
        }
    }
}

/// What reset and new-chat do while a reply is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// Abort the pending request and reset; a late reply is discarded
    #[default]
    Cancel,
    /// Refuse with a busy error until the reply arrives
    Reject,
}

#[derive(Debug, Error)]
#[error("unknown reset policy '{0}' (expected 'cancel' or 'reject')")]
pub struct ParseResetPolicyError(String);

impl FromStr for ResetPolicy {
    type Err = ParseResetPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cancel" => Ok(Self::Cancel),
            "reject" => Ok(Self::Reject),
            other => Err(ParseResetPolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancel => f.write_str("cancel"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Immutable per-conversation settings consulted by transitions
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub conversation_id: String,
    pub reset_policy: ResetPolicy,
}

impl ChatContext {
    pub fn new(conversation_id: impl Into<String>, reset_policy: ResetPolicy) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            reset_policy,
        }
    }
}

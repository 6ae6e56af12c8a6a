//! Conversation data model
//!
//! A conversation is an ordered transcript of turns plus the sidebar list
//! of conversation titles. Both are owned by the runtime; nothing else
//! mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text of the system turn every conversation starts with.
pub const WELCOME_MESSAGE: &str = "Welcome to Botifyx! I'm your AI assistant powered by advanced language models. How can I help you today?";

/// Title inserted at the head of the title list by "new chat".
pub const DEFAULT_TITLE: &str = "New conversation";

/// Titles shown in the sidebar before any "new chat".
pub const SEED_TITLES: [&str; 4] = [
    DEFAULT_TITLE,
    "Sales analysis Q2 2025",
    "Marketing strategy",
    "Product roadmap",
];

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conversational turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Fresh welcome turn with a newly minted id
    pub fn welcome() -> Self {
        Self::new(new_message_id(), Role::System, WELCOME_MESSAGE)
    }
}

/// Mint a unique message id
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The live message sequence of the active conversation.
///
/// Always non-empty: it starts with the welcome turn and `reset` restores
/// exactly that shape. Order is creation order.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::welcome()],
        }
    }

    /// Append a turn, returning a reference to it.
    ///
    /// A turn whose id is already present is ignored; ids stay unique
    /// within the sequence.
    pub fn push(&mut self, message: Message) -> Option<&Message> {
        if self.contains(&message.id) {
            tracing::warn!(id = %message.id, "Dropping message with duplicate id");
            return None;
        }
        self.messages.push(message);
        self.messages.last()
    }

    /// Replace the sequence with a single fresh welcome turn
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::welcome());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[allow(dead_code)] // Inspection helper
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // Inspection helper
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Sidebar conversation titles, newest first.
///
/// Titles other than the head are inert labels; selecting one loads nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleList {
    titles: Vec<String>,
}

impl Default for TitleList {
    fn default() -> Self {
        Self::seeded()
    }
}

impl TitleList {
    pub fn new(titles: Vec<String>) -> Self {
        Self { titles }
    }

    pub fn seeded() -> Self {
        Self::new(SEED_TITLES.iter().map(ToString::to_string).collect())
    }

    pub fn prepend(&mut self, title: impl Into<String>) {
        self.titles.insert(0, title.into());
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    #[allow(dead_code)] // Inspection helper
    pub fn len(&self) -> usize {
        self.titles.len()
    }
}

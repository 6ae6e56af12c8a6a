//! Keyword-driven canned replies
//!
//! Stands in for a model backend. Rules are checked in order against the
//! lower-cased input and the first hit wins.

use super::{ResponseError, ResponseSource};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const GREETING_REPLY: &str = "Hello! I'm Botifyx, your AI assistant. How can I help you today?";

pub const HELP_REPLY: &str = "I can help with a variety of tasks including answering questions, generating content, analyzing data, and more. Just let me know what you need!";

pub const CAPABILITIES_REPLY: &str = "As an AI assistant, I can help with content creation, data analysis, answering questions, brainstorming ideas, and much more. I'm designed to be your productivity partner.";

pub const THANKS_REPLY: &str = "You're welcome! If you have any other questions or need assistance with anything else, feel free to ask.";

pub const FALLBACK_REPLY: &str = "I've processed your request. To provide a more accurate response, I would need to connect to the OpenAI API. In a production environment, I would generate a thoughtful, helpful response based on your specific query.";

struct Rule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: [Rule; 4] = [
    Rule {
        keywords: &["hello", "hi"],
        reply: GREETING_REPLY,
    },
    Rule {
        keywords: &["help"],
        reply: HELP_REPLY,
    },
    Rule {
        keywords: &["feature", "can you"],
        reply: CAPABILITIES_REPLY,
    },
    Rule {
        keywords: &["thank"],
        reply: THANKS_REPLY,
    },
];

/// How a keyword is matched against the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Raw substring containment. "this" matches "hi".
    #[default]
    Substring,
    /// Whole tokens, allowing a trailing plural "s" on keywords of three or
    /// more letters ("thanks" matches "thank", "his" does not match "hi").
    Word,
}

#[derive(Debug, Error)]
#[error("unknown match mode '{0}' (expected 'substring' or 'word')")]
pub struct ParseMatchModeError(String);

impl FromStr for MatchMode {
    type Err = ParseMatchModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "word" | "token" => Ok(Self::Word),
            other => Err(ParseMatchModeError(other.to_string())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => f.write_str("substring"),
            Self::Word => f.write_str("word"),
        }
    }
}

/// Pick the canned reply for `input` using substring matching.
pub fn dispatch(input: &str) -> &'static str {
    dispatch_with(input, MatchMode::Substring)
}

/// Pick the canned reply for `input`. Total and deterministic.
pub fn dispatch_with(input: &str, mode: MatchMode) -> &'static str {
    let lowered = input.to_lowercase();
    let tokens = match mode {
        MatchMode::Substring => Vec::new(),
        MatchMode::Word => tokenize(&lowered),
    };

    RULES
        .iter()
        .find(|rule| {
            rule.keywords.iter().any(|keyword| match mode {
                MatchMode::Substring => lowered.contains(keyword),
                MatchMode::Word => contains_phrase(&tokens, keyword),
            })
        })
        .map_or(FALLBACK_REPLY, |rule| rule.reply)
}

fn tokenize(lowered: &str) -> Vec<&str> {
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_phrase(tokens: &[&str], keyword: &str) -> bool {
    let words: Vec<&str> = keyword.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| token_matches(t, w)))
}

/// Shortest keyword that also matches with a trailing "s". Keeps "his"
/// from matching "hi".
const MIN_PLURAL_STEM: usize = 3;

fn token_matches(token: &str, word: &str) -> bool {
    token == word
        || (word.len() >= MIN_PLURAL_STEM && token.strip_suffix('s') == Some(word))
}

/// Response source backed by the canned rules. Never fails.
#[derive(Debug, Clone, Default)]
pub struct CannedResponder {
    mode: MatchMode,
}

impl CannedResponder {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl ResponseSource for CannedResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponseError> {
        Ok(dispatch_with(text, self.mode).to_string())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

//! Service configuration from environment variables

use crate::responder::{MatchMode, DEFAULT_RESPONSE_DELAY};
use crate::runtime::DEFAULT_RESPONSE_TIMEOUT;
use crate::state_machine::ResetPolicy;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

/// Runtime configuration for the chat service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub port: u16,
    /// Artificial "thinking" delay before each canned reply
    pub response_delay: Duration,
    /// Give up on a reply after this long
    pub response_timeout: Duration,
    pub match_mode: MatchMode,
    pub reset_policy: ResetPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            response_delay: DEFAULT_RESPONSE_DELAY,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            match_mode: MatchMode::default(),
            reset_policy: ResetPolicy::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Bad values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("BOTIFYX_PORT", lookup("BOTIFYX_PORT"), defaults.port),
            response_delay: parse_millis_or(
                "BOTIFYX_RESPONSE_DELAY_MS",
                lookup("BOTIFYX_RESPONSE_DELAY_MS"),
                defaults.response_delay,
            ),
            response_timeout: parse_millis_or(
                "BOTIFYX_RESPONSE_TIMEOUT_MS",
                lookup("BOTIFYX_RESPONSE_TIMEOUT_MS"),
                defaults.response_timeout,
            ),
            match_mode: parse_or(
                "BOTIFYX_MATCH_MODE",
                lookup("BOTIFYX_MATCH_MODE"),
                defaults.match_mode,
            ),
            reset_policy: parse_or(
                "BOTIFYX_RESET_POLICY",
                lookup("BOTIFYX_RESET_POLICY"),
                defaults.reset_policy,
            ),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %value, error = %e, "Invalid config value, using default");
            default
        }),
    }
}

fn parse_millis_or(key: &str, raw: Option<String>, default: Duration) -> Duration {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(parse_or(key, raw, default_ms))
}

//! Response source abstraction
//!
//! The runtime asks a `ResponseSource` for the assistant's reply to each
//! user turn. The canned keyword responder is the only backend here; a
//! model-backed source plugs in behind the same trait.

mod canned;
mod error;

#[allow(unused_imports)] // dispatch is used by test doubles
pub use canned::{dispatch, dispatch_with, CannedResponder, MatchMode};
#[allow(unused_imports)] // Reply constants are part of the public surface
pub use canned::{
    CAPABILITIES_REPLY, FALLBACK_REPLY, GREETING_REPLY, HELP_REPLY, THANKS_REPLY,
};
pub use error::{ResponseError, ResponseErrorKind};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Simulated "thinking" latency before each canned reply
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1500);

/// Produces an assistant reply for a user turn
#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Generate a reply. May take arbitrarily long.
    async fn respond(&self, text: &str) -> Result<String, ResponseError>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ResponseSource + ?Sized> ResponseSource for Arc<T> {
    async fn respond(&self, text: &str) -> Result<String, ResponseError> {
        (**self).respond(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Adds a fixed latency before delegating to the inner source
pub struct DelayedResponder<R> {
    inner: R,
    delay: Duration,
}

impl<R: ResponseSource> DelayedResponder<R> {
    pub fn new(inner: R, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<R: ResponseSource> ResponseSource for DelayedResponder<R> {
    async fn respond(&self, text: &str) -> Result<String, ResponseError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.respond(text).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Logging wrapper for response sources
pub struct LoggingResponder {
    inner: Arc<dyn ResponseSource>,
    name: String,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn ResponseSource>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl ResponseSource for LoggingResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponseError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(text).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    source = %self.name,
                    duration_ms = %duration.as_millis(),
                    input_chars = text.chars().count(),
                    reply_chars = reply.chars().count(),
                    "Response generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    source = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Response generation failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the default responder stack: canned rules, artificial delay, logging
pub fn default_responder(mode: MatchMode, delay: Duration) -> LoggingResponder {
    let delayed = DelayedResponder::new(CannedResponder::new(mode), delay);
    LoggingResponder::new(Arc::new(delayed))
}

//! Runtime for executing the active conversation
//!
//! A single task owns the transcript, the title list and the state
//! machine. Everything else talks to it through a `ChatHandle`, so
//! mutations are serialized and observers always see a consistent
//! sequence.

mod executor;


pub use executor::ChatRuntime;

use crate::conversation::{new_message_id, Message, TitleList};
use crate::responder::ResponseSource;
use crate::state_machine::{ChatContext, ChatState, Event, TransitionError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Upper bound on how long a single reply may take
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Events sent to streaming observers
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A turn was appended
    Message { message: Message },
    /// Transcript replaced with a fresh welcome turn
    Reset { messages: Vec<Message> },
    /// Title list changed
    Titles { titles: Vec<String> },
    /// State machine moved
    StateChange { state: ChatState, busy: bool },
    Error { message: String },
}

/// Point-in-time view of the conversation for presentation logic
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub titles: Vec<String>,
    pub state: ChatState,
    /// True while a reply is pending; gates resubmission
    pub busy: bool,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Conversation runtime has stopped")]
    Stopped,
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

/// An event queued for the runtime.
///
/// Events from a `ChatHandle` carry `ack`, which receives the outcome of
/// the transition once it has been applied.
#[derive(Debug)]
pub struct Envelope {
    pub event: Event,
    pub ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl Envelope {
    /// Fire-and-forget event, used for responder outcomes
    pub fn new(event: Event) -> Self {
        Self { event, ack: None }
    }
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ChatHandle {
    event_tx: mpsc::Sender<Envelope>,
    broadcast_tx: broadcast::Sender<ChatEvent>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
}

impl ChatHandle {
    /// Submit a user turn and wait for the runtime to apply it.
    ///
    /// Returns the id of the appended user turn. Blank text fails with
    /// `TransitionError::EmptyInput` and a pending reply with
    /// `TransitionError::Busy`; neither appends anything.
    pub async fn submit_user_message(
        &self,
        text: impl Into<String>,
    ) -> Result<String, RuntimeError> {
        let message_id = new_message_id();
        self.send(Event::UserMessage {
            message_id: message_id.clone(),
            text: text.into(),
        })
        .await?;
        Ok(message_id)
    }

    /// Replace the transcript with a fresh welcome turn
    ///
    /// Fails with `TransitionError::Busy` while a reply is pending under
    /// `ResetPolicy::Reject`.
    pub async fn reset_conversation(&self) -> Result<(), RuntimeError> {
        self.send(Event::Reset).await
    }

    /// Reset and put a new default title at the head of the title list
    pub async fn start_new_conversation(&self) -> Result<(), RuntimeError> {
        self.send(Event::NewConversation).await
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that is notified whenever the snapshot changes
    #[allow(dead_code)] // For observers that wait on state
    pub fn watch(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribe to conversation updates
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.broadcast_tx.subscribe()
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.event_tx
            .send(Envelope {
                event,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        ack_rx.await.map_err(|_| RuntimeError::Stopped)??;
        Ok(())
    }
}

/// Start a conversation runtime on the current tokio runtime
pub fn spawn<R>(
    context: ChatContext,
    titles: TitleList,
    responder: R,
    response_timeout: Duration,
) -> ChatHandle
where
    R: ResponseSource + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = ChatRuntime::new(
        context,
        titles,
        responder,
        response_timeout,
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
    );
    let snapshot_rx = runtime.watch();

    let conv_id = runtime.conversation_id().to_string();
    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
    });

    ChatHandle {
        event_tx,
        broadcast_tx,
        snapshot_rx,
    }
}

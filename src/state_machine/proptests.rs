//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::conversation::{Message, Role, Transcript, TitleList, DEFAULT_TITLE};
use crate::responder::ResponseErrorKind;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(policy: ResetPolicy) -> ChatContext {
    ChatContext::new("test-conv", policy)
}

/// Minimal effect interpreter mirroring what the runtime does to its data
struct Model {
    state: ChatState,
    transcript: Transcript,
    titles: TitleList,
}

impl Model {
    fn new() -> Self {
        Self {
            state: ChatState::Idle,
            transcript: Transcript::new(),
            titles: TitleList::seeded(),
        }
    }

    fn apply(&mut self, context: &ChatContext, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, context, event)?;
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::AppendMessage { id, role, content } => {
                    self.transcript.push(Message::new(id, role, content));
                }
                Effect::ResetTranscript => self.transcript.reset(),
                Effect::PrependTitle { title } => self.titles.prepend(title),
                Effect::RequestResponse { .. }
                | Effect::AbortResponse
                | Effect::NotifyError { .. }
                | Effect::PublishState => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_nonblank_text() -> impl Strategy<Value = String> {
    "[ ]{0,3}[a-zA-Z0-9?!,.]{1,20}[ a-z]{0,10}"
}

fn arb_blank_text() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

fn arb_error_kind() -> impl Strategy<Value = ResponseErrorKind> {
    prop_oneof![
        Just(ResponseErrorKind::Network),
        Just(ResponseErrorKind::RateLimit),
        Just(ResponseErrorKind::ServerError),
        Just(ResponseErrorKind::Timeout),
        Just(ResponseErrorKind::Unknown),
    ]
}

fn arb_policy() -> impl Strategy<Value = ResetPolicy> {
    prop_oneof![Just(ResetPolicy::Cancel), Just(ResetPolicy::Reject)]
}

fn arb_state() -> impl Strategy<Value = ChatState> {
    prop_oneof![
        Just(ChatState::Idle),
        "[a-z]{8}".prop_map(|request_id| ChatState::AwaitingResponse { request_id }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ("[a-z]{8}", prop_oneof![arb_nonblank_text(), arb_blank_text()])
            .prop_map(|(message_id, text)| Event::UserMessage { message_id, text }),
        Just(Event::Reset),
        Just(Event::NewConversation),
        ("[a-z]{8}", "[a-z]{8}", "[a-z ]{1,20}").prop_map(|(request_id, reply_id, text)| {
            Event::ResponseReady {
                request_id,
                reply_id,
                text,
            }
        }),
        ("[a-z]{8}", "[a-z]{8}", arb_error_kind()).prop_map(|(request_id, reply_id, kind)| {
            Event::ResponseFailed {
                request_id,
                reply_id,
                message: "failure".to_string(),
                kind,
            }
        }),
    ]
}

/// Scripted user actions for sequence tests; replies are generated in order
#[derive(Debug, Clone)]
enum Action {
    Submit(String),
    Deliver,
    Fail(ResponseErrorKind),
    Reset,
    NewConversation,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => prop_oneof![arb_nonblank_text(), arb_blank_text()].prop_map(Action::Submit),
        3 => Just(Action::Deliver),
        1 => arb_error_kind().prop_map(Action::Fail),
        1 => Just(Action::Reset),
        1 => Just(Action::NewConversation),
    ]
}

fn action_to_event(model: &Model, action: &Action, step: usize) -> Event {
    let pending = model
        .state
        .pending_request()
        .map_or_else(|| "nothing-pending".to_string(), ToString::to_string);
    match action {
        Action::Submit(text) => Event::UserMessage {
            message_id: format!("user-{step}"),
            text: text.clone(),
        },
        Action::Deliver => Event::ResponseReady {
            request_id: pending,
            reply_id: format!("reply-{step}"),
            text: "reply".to_string(),
        },
        Action::Fail(kind) => Event::ResponseFailed {
            request_id: pending,
            reply_id: format!("reply-{step}"),
            message: "failed".to_string(),
            kind: *kind,
        },
        Action::Reset => Event::Reset,
        Action::NewConversation => Event::NewConversation,
    }
}

// ============================================================================
// Single-step properties
// ============================================================================

proptest! {
    #[test]
    fn prop_valid_submit_from_idle_requests_once(id in "[a-z]{8}", text in arb_nonblank_text()) {
        let result = transition(
            &ChatState::Idle,
            &test_context(ResetPolicy::Cancel),
            Event::UserMessage { message_id: id.clone(), text: text.clone() },
        ).unwrap();

        prop_assert_eq!(result.new_state, ChatState::AwaitingResponse { request_id: id.clone() });
        let requests = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::RequestResponse { .. }))
            .count();
        prop_assert_eq!(requests, 1);
        prop_assert_eq!(&result.effects[0], &Effect::user_message(id, text));
    }

    #[test]
    fn prop_blank_submit_never_changes_anything(id in "[a-z]{8}", text in arb_blank_text()) {
        let result = transition(
            &ChatState::Idle,
            &test_context(ResetPolicy::Cancel),
            Event::UserMessage { message_id: id, text },
        );
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyInput);
    }

    #[test]
    fn prop_busy_state_never_accepts_user_message(
        state in "[a-z]{8}".prop_map(|request_id| ChatState::AwaitingResponse { request_id }),
        text in arb_nonblank_text(),
    ) {
        let result = transition(
            &state,
            &test_context(ResetPolicy::Cancel),
            Event::UserMessage { message_id: "x".to_string(), text },
        );
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    #[test]
    fn prop_successful_transitions_from_busy_to_idle_never_request(
        state in arb_state(),
        event in arb_event(),
        policy in arb_policy(),
    ) {
        if let Ok(result) = transition(&state, &test_context(policy), event) {
            if result.new_state == ChatState::Idle {
                let requested = result
                    .effects
                    .iter()
                    .any(|e| matches!(e, Effect::RequestResponse { .. }));
                prop_assert!(!requested);
            }
        }
    }

    #[test]
    fn prop_every_successful_transition_publishes_state(
        state in arb_state(),
        event in arb_event(),
        policy in arb_policy(),
    ) {
        if let Ok(result) = transition(&state, &test_context(policy), event) {
            prop_assert!(result.effects.contains(&Effect::PublishState));
        }
    }

    #[test]
    fn prop_abort_only_when_leaving_busy(
        state in arb_state(),
        event in arb_event(),
        policy in arb_policy(),
    ) {
        if let Ok(result) = transition(&state, &test_context(policy), event) {
            if result.effects.contains(&Effect::AbortResponse) {
                prop_assert!(state.is_busy());
                prop_assert_eq!(policy, ResetPolicy::Cancel);
                prop_assert_eq!(result.new_state, ChatState::Idle);
            }
        }
    }
}

// ============================================================================
// Sequence properties
// ============================================================================

proptest! {
    #[test]
    fn prop_transcript_invariants_hold(
        actions in proptest::collection::vec(arb_action(), 0..40),
        policy in arb_policy(),
    ) {
        let context = test_context(policy);
        let mut model = Model::new();

        for (step, action) in actions.iter().enumerate() {
            let event = action_to_event(&model, action, step);
            let titles_before = model.titles.len();
            let _ = model.apply(&context, event);

            let messages = model.transcript.messages();
            // Welcome turn always first, and only there
            prop_assert_eq!(messages[0].role, Role::System);
            prop_assert!(messages[1..].iter().all(|m| m.role != Role::System));

            // Ids unique
            let mut ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), messages.len());

            // Turns alternate user/assistant; a trailing user turn means busy
            for (i, m) in messages[1..].iter().enumerate() {
                let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
                prop_assert_eq!(m.role, expected);
            }
            let trailing_user = messages.last().map(|m| m.role) == Some(Role::User);
            prop_assert_eq!(trailing_user, model.state.is_busy());

            // Titles only ever grow by one, at the head
            let grown = model.titles.len() - titles_before;
            prop_assert!(grown <= 1);
            if grown == 1 {
                prop_assert_eq!(model.titles.titles()[0].as_str(), DEFAULT_TITLE);
                prop_assert_eq!(model.transcript.len(), 1);
            }
        }
    }

    #[test]
    fn prop_submit_then_deliver_appends_exactly_two(text in arb_nonblank_text()) {
        let context = test_context(ResetPolicy::Cancel);
        let mut model = Model::new();
        let before = model.transcript.len();

        model.apply(&context, Event::UserMessage {
            message_id: "u".to_string(),
            text: text.clone(),
        }).unwrap();
        model.apply(&context, Event::ResponseReady {
            request_id: "u".to_string(),
            reply_id: "a".to_string(),
            text: "reply".to_string(),
        }).unwrap();

        let messages = model.transcript.messages();
        prop_assert_eq!(messages.len(), before + 2);
        prop_assert_eq!(messages[before].role, Role::User);
        prop_assert_eq!(&messages[before].content, &text);
        prop_assert_eq!(messages[before + 1].role, Role::Assistant);
        prop_assert_eq!(&model.state, &ChatState::Idle);
    }

    #[test]
    fn prop_reset_is_idempotent(actions in proptest::collection::vec(arb_action(), 0..20)) {
        let context = test_context(ResetPolicy::Cancel);
        let mut model = Model::new();
        for (step, action) in actions.iter().enumerate() {
            let event = action_to_event(&model, action, step);
            let _ = model.apply(&context, event);
        }

        model.apply(&context, Event::Reset).unwrap();
        let first = model.transcript.messages().to_vec();
        model.apply(&context, Event::Reset).unwrap();
        let second = model.transcript.messages();

        prop_assert_eq!(first.len(), 1);
        prop_assert_eq!(second.len(), 1);
        prop_assert_eq!(first[0].role, second[0].role);
        prop_assert_eq!(&first[0].content, &second[0].content);
        prop_assert_eq!(&model.state, &ChatState::Idle);
    }
}

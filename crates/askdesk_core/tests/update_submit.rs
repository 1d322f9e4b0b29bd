use std::sync::Once;

use askdesk_core::{update, AppState, ChatError, Effect, Msg, Sender};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(desk_logging::initialize_for_tests);
}

fn submit(state: AppState, query: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::QuerySubmitted(query.to_string()))
}

#[test]
fn submission_appends_user_message_before_any_answer() {
    init_logging();
    let (mut state, effects) = submit(AppState::new(), "  what is rust?  ");

    assert_eq!(
        effects,
        vec![Effect::SubmitQuery {
            query: "what is rust?".to_string()
        }]
    );
    assert!(state.is_awaiting());
    assert!(state.consume_dirty());
    let messages = state.conversation().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "what is rust?");
}

#[test]
fn blank_query_is_ignored() {
    init_logging();
    let (state, effects) = submit(AppState::new(), " \n\t ");
    assert!(effects.is_empty());
    assert!(state.conversation().is_empty());
    assert!(!state.is_awaiting());
}

#[test]
fn second_submission_while_awaiting_is_noop() {
    init_logging();
    let (state, _) = submit(AppState::new(), "first");
    let before = state.conversation().len();

    let (state, effects) = submit(state, "second");
    assert!(effects.is_empty());
    assert_eq!(state.conversation().len(), before);
    assert!(state.is_awaiting());
}

#[test]
fn immediate_answer_appends_assistant_and_clears_guard() {
    init_logging();
    let (state, _) = submit(AppState::new(), "q");
    let (state, effects) = update(
        state,
        Msg::QueryAnswered {
            answer: "42 [source: guide]".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.is_awaiting());
    let last = state.conversation().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, "42 [source: guide]");
    assert!(!last.is_status);

    let view = state.view();
    let citations: Vec<_> = view.messages[1].citations().collect();
    assert_eq!(citations, vec!["guide"]);

    // Guard cleared: the next query goes through.
    let (state, effects) = submit(state, "again");
    assert_eq!(effects.len(), 1);
    assert_eq!(state.conversation().len(), 3);
}

#[test]
fn failed_submission_appends_error_and_clears_guard() {
    init_logging();
    let (state, _) = submit(AppState::new(), "q");
    let (state, _) = update(
        state,
        Msg::QueryFailed {
            error: ChatError::SubmissionRejected {
                status: 500,
                detail: Some("backend exploded".into()),
            },
        },
    );

    assert!(!state.is_awaiting());
    let last = state.conversation().last().unwrap();
    assert_eq!(last.text, "Error: backend exploded");
    assert!(last.is_error());
    assert!(state.view().messages[1].is_error);
}

#[test]
fn answer_without_pending_submission_is_ignored() {
    init_logging();
    let state = AppState::new();
    let (next, _) = update(
        state.clone(),
        Msg::QueryAnswered {
            answer: "stray".into(),
        },
    );
    assert_eq!(next, state);
}

#[test]
fn user_text_that_looks_like_error_is_not_flagged() {
    init_logging();
    let (state, _) = submit(AppState::new(), "Error: why do I get this?");
    let view = state.view();
    assert!(!view.messages[0].is_error);
}

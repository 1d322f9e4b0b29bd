use crate::{AppState, ChatError, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QuerySubmitted(raw) => {
            let query = raw.trim();
            // The awaiting guard is the only admission control: one request at a time.
            if query.is_empty() || state.is_awaiting() {
                return (state, Vec::new());
            }
            state.begin_request(query);
            vec![Effect::SubmitQuery {
                query: query.to_string(),
            }]
        }
        Msg::QueryAnswered { answer } => {
            if state.awaiting_submission() {
                state.finish_without_job(answer);
            }
            Vec::new()
        }
        Msg::QueryFailed { error } => {
            if state.awaiting_submission() {
                state.finish_without_job(error.user_message());
            }
            Vec::new()
        }
        Msg::JobAccepted { job_id } => {
            if !state.awaiting_submission() {
                return (state, Vec::new());
            }
            state.start_job(job_id.clone());
            vec![Effect::PollJob { job_id }]
        }
        Msg::JobFinished { job_id, outcome } => {
            // Stale results (cancelled or already replaced) fall through as no-ops.
            state.finish_job(&job_id, outcome.into_text());
            Vec::new()
        }
        Msg::CancelRequested => match state.active_job().cloned() {
            Some(job_id) => {
                state.finish_job(&job_id, ChatError::Cancelled.user_message());
                vec![Effect::CancelJob { job_id }]
            }
            None => Vec::new(),
        },
    };

    (state, effects)
}

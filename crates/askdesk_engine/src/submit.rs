use askdesk_core::{normalize_response, ChatError, Msg};
use desk_logging::{desk_info, desk_warn};

use crate::{Backend, BackendError, FailureKind, SubmitReply};

/// Sends one query and turns the reply into the message the conversation needs.
///
/// Never fails: every error becomes [`Msg::QueryFailed`].
pub async fn submit_query(backend: &dyn Backend, query: &str) -> Msg {
    match backend.submit(query).await {
        Ok(SubmitReply::Answered(payload)) => {
            desk_info!("Query answered immediately");
            Msg::QueryAnswered {
                answer: normalize_response(&payload),
            }
        }
        Ok(SubmitReply::Accepted(job_id)) => {
            desk_info!("Query deferred to job {}", job_id);
            Msg::JobAccepted { job_id }
        }
        Err(err) => {
            desk_warn!("Query submission failed: {}", err);
            Msg::QueryFailed {
                error: to_chat_error(err),
            }
        }
    }
}

fn to_chat_error(err: BackendError) -> ChatError {
    match err.kind {
        FailureKind::HttpStatus { status, detail } => {
            ChatError::SubmissionRejected { status, detail }
        }
        _ => ChatError::TransportFailure(err.to_string()),
    }
}

use crate::{ChatError, JobId, JobOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted the input box (raw, untrimmed).
    QuerySubmitted(String),
    /// Backend answered synchronously; the text is already normalized.
    QueryAnswered { answer: String },
    /// Backend deferred the query to a background job.
    JobAccepted { job_id: JobId },
    /// Submission failed before any job existed.
    QueryFailed { error: ChatError },
    /// Poller reached a terminal outcome for a job.
    JobFinished { job_id: JobId, outcome: JobOutcome },
    /// User abandoned the outstanding job.
    CancelRequested,
}

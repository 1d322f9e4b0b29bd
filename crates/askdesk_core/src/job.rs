use std::fmt;

use thiserror::Error;

use crate::message::ERROR_PREFIX;

/// Opaque identifier handed out by the backend when it defers a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Error,
    /// Client-side: attempt budget exhausted.
    Timeout,
    /// Client-side: the status query itself failed.
    TransportError,
}

impl JobStatus {
    /// Parses a server-reported status. Client-only states never come off the wire.
    pub fn from_wire(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("pending") {
            Some(JobStatus::Pending)
        } else if raw.eq_ignore_ascii_case("processing") {
            Some(JobStatus::Processing)
        } else if raw.eq_ignore_ascii_case("complete") {
            Some(JobStatus::Complete)
        } else if raw.eq_ignore_ascii_case("error") || raw.eq_ignore_ascii_case("failed") {
            Some(JobStatus::Error)
        } else {
            None
        }
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_in_flight()
    }
}

/// Every way a query can end without an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{}", rejected_text(.status, .detail))]
    SubmissionRejected { status: u16, detail: Option<String> },
    #[error("could not reach the answering service ({0})")]
    TransportFailure(String),
    #[error("no answer arrived after {attempts} status checks, please try again")]
    JobTimeout { attempts: u32 },
    #[error("{}", failed_text(.0))]
    JobFailed(Option<String>),
    #[error("request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Text of the assistant message standing in for the missing answer.
    pub fn user_message(&self) -> String {
        format!("{ERROR_PREFIX}{self}")
    }
}

fn rejected_text(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("the answering service rejected the query (http status {status})"),
    }
}

fn failed_text(detail: &Option<String>) -> &str {
    detail
        .as_deref()
        .unwrap_or("the answering service could not process this query")
}

/// Terminal result of a deferred job as seen by the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Answered(String),
    Failed(ChatError),
}

impl JobOutcome {
    pub fn into_text(self) -> String {
        match self {
            JobOutcome::Answered(text) => text,
            JobOutcome::Failed(err) => err.user_message(),
        }
    }
}

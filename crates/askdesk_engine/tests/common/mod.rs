#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use askdesk_core::{JobId, JobStatus};
use askdesk_engine::{Backend, BackendError, FailureKind, StatusReport, SubmitReply};
use serde_json::Value;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(desk_logging::initialize_for_tests);
}

/// In-memory backend replaying a fixed script. Once the status script runs
/// out every further query reports `PENDING`.
pub struct ScriptedBackend {
    submit_reply: Mutex<Option<Result<SubmitReply, BackendError>>>,
    statuses: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(statuses: Vec<Result<StatusReport, BackendError>>) -> Self {
        Self {
            submit_reply: Mutex::new(None),
            statuses: Mutex::new(statuses.into()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_submit_reply(self, reply: Result<SubmitReply, BackendError>) -> Self {
        *self.submit_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    async fn submit(&self, _query: &str) -> Result<SubmitReply, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_reply
            .lock()
            .unwrap()
            .take()
            .expect("submit reply scripted")
    }

    async fn status(&self, _job_id: &JobId) -> Result<StatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending()))
    }
}

pub fn pending() -> StatusReport {
    StatusReport {
        status: JobStatus::Pending,
        response: None,
        error: None,
    }
}

pub fn processing() -> StatusReport {
    StatusReport {
        status: JobStatus::Processing,
        ..pending()
    }
}

pub fn complete(response: Value) -> StatusReport {
    StatusReport {
        status: JobStatus::Complete,
        response: Some(response),
        error: None,
    }
}

pub fn failed(detail: &str) -> StatusReport {
    StatusReport {
        status: JobStatus::Error,
        response: None,
        error: Some(detail.to_string()),
    }
}

pub fn network_error() -> BackendError {
    BackendError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

use std::time::Duration;

use askdesk_core::{normalize_response, ChatError, JobId, JobOutcome, JobStatus};
use desk_logging::{desk_debug, desk_info, desk_warn};
use tokio_util::sync::CancellationToken;

use crate::{Backend, BackendError, StatusReport};

/// What a failed status query means for the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportPolicy {
    /// The job ends with a transport failure on the first failed query.
    FailFast,
    /// A failed query spends one attempt and polling goes on.
    RetryWithinBudget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Status queries allowed per job. The only timeout there is.
    pub max_attempts: u32,
    pub transport_policy: TransportPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_attempts: 15,
            transport_policy: TransportPolicy::RetryWithinBudget,
        }
    }
}

impl PollSettings {
    /// Longest a job can stay outstanding before it times out.
    pub fn budget(&self) -> Duration {
        self.interval * self.effective_max_attempts()
    }

    fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    Finished(JobOutcome),
}

/// Polling state of one deferred job.
///
/// `attempt` counts status queries already made. Once a step returns
/// [`PollStep::Finished`] the poller is spent and further steps are refused.
#[derive(Debug, Clone)]
pub struct JobPoller {
    job_id: JobId,
    settings: PollSettings,
    attempt: u32,
    status: JobStatus,
}

impl JobPoller {
    pub fn new(job_id: JobId, settings: PollSettings) -> Self {
        Self {
            job_id,
            settings,
            attempt: 0,
            status: JobStatus::Pending,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Makes one status query and classifies it. Does not wait.
    pub async fn poll_once(&mut self, backend: &dyn Backend) -> Option<PollStep> {
        if self.is_finished() {
            return None;
        }
        let report = backend.status(&self.job_id).await;
        self.attempt += 1;
        Some(self.classify(report))
    }

    /// Drives the job to a terminal outcome, waiting `interval` before every query.
    ///
    /// Returns `None` when cancelled; nothing is reported after that point.
    pub async fn run(
        mut self,
        backend: &dyn Backend,
        cancel: &CancellationToken,
    ) -> Option<JobOutcome> {
        desk_info!(
            "Polling job {} (max {} attempts, every {:?})",
            self.job_id,
            self.settings.effective_max_attempts(),
            self.settings.interval
        );
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                step = self.poll_once(backend) => Some(step),
            };
            let Some(step) = polled else {
                return self.cancelled();
            };
            match step {
                Some(PollStep::Continue) => {}
                Some(PollStep::Finished(outcome)) => {
                    desk_info!(
                        "Job {} finished as {:?} after {} attempts",
                        self.job_id,
                        self.status,
                        self.attempt
                    );
                    return Some(outcome);
                }
                None => return None,
            }
        }
    }

    fn cancelled(&self) -> Option<JobOutcome> {
        desk_info!("Job {} cancelled after {} attempts", self.job_id, self.attempt);
        None
    }

    fn classify(&mut self, report: Result<StatusReport, BackendError>) -> PollStep {
        let report = match report {
            Ok(report) => report,
            Err(err) => return self.transport_failure(err.to_string()),
        };

        match report.status {
            JobStatus::Complete => {
                self.status = JobStatus::Complete;
                let outcome = match report.response {
                    Some(payload) => JobOutcome::Answered(normalize_response(&payload)),
                    None => JobOutcome::Failed(ChatError::JobFailed(Some(
                        "the job completed without an answer".to_string(),
                    ))),
                };
                PollStep::Finished(outcome)
            }
            JobStatus::Error => {
                self.status = JobStatus::Error;
                PollStep::Finished(JobOutcome::Failed(ChatError::JobFailed(report.error)))
            }
            JobStatus::Pending | JobStatus::Processing => {
                desk_debug!(
                    "Job {} still {:?} (attempt {})",
                    self.job_id,
                    report.status,
                    self.attempt
                );
                if self.budget_spent() {
                    self.status = JobStatus::Timeout;
                    return PollStep::Finished(JobOutcome::Failed(ChatError::JobTimeout {
                        attempts: self.attempt,
                    }));
                }
                self.status = report.status;
                PollStep::Continue
            }
            // Client-side states never come off the wire.
            JobStatus::Timeout | JobStatus::TransportError => {
                self.transport_failure(format!("unexpected job status {:?}", report.status))
            }
        }
    }

    fn transport_failure(&mut self, message: String) -> PollStep {
        desk_warn!(
            "Status query {} for job {} failed: {}",
            self.attempt,
            self.job_id,
            message
        );
        let terminal = match self.settings.transport_policy {
            TransportPolicy::FailFast => true,
            TransportPolicy::RetryWithinBudget => self.budget_spent(),
        };
        if terminal {
            self.status = JobStatus::TransportError;
            PollStep::Finished(JobOutcome::Failed(ChatError::TransportFailure(message)))
        } else {
            PollStep::Continue
        }
    }

    fn budget_spent(&self) -> bool {
        self.attempt >= self.settings.effective_max_attempts()
    }
}

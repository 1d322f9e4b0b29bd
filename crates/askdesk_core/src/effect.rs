use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitQuery { query: String },
    PollJob { job_id: JobId },
    CancelJob { job_id: JobId },
}

//! Askdesk engine: backend IO, job polling and effect execution.
mod backend;
mod engine;
mod poller;
mod submit;
mod types;

pub use backend::{Backend, BackendSettings, ReqwestBackend, JOB_ID_PLACEHOLDER};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use poller::{JobPoller, PollSettings, PollStep, TransportPolicy};
pub use submit::submit_query;
pub use types::{BackendError, FailureKind, StatusReport, SubmitReply};

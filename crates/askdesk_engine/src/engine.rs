use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use askdesk_core::{Effect, JobId, Msg};
use desk_logging::{desk_debug, desk_info};
use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    submit_query, Backend, BackendError, BackendSettings, JobPoller, PollSettings,
    ReqwestBackend,
};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub polling: PollSettings,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

type CancelTokens = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Executes core effects on a background single-threaded runtime and reports
/// results back as core messages.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<Effect>,
    event_rx: Arc<Mutex<mpsc::Receiver<Msg>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let backend = ReqwestBackend::new(config.backend)?;
        Self::with_backend(Arc::new(backend), config.polling)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        polling: PollSettings,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let tokens: CancelTokens = Arc::default();
            runtime.block_on(async move {
                while let Some(effect) = cmd_rx.recv().await {
                    dispatch(effect, &backend, polling, &tokens, &event_tx);
                }
            });
            desk_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn execute(&self, effect: Effect) {
        let _ = self.cmd_tx.send(effect);
    }

    pub fn try_recv(&self) -> Option<Msg> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Msg> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

fn dispatch(
    effect: Effect,
    backend: &Arc<dyn Backend>,
    polling: PollSettings,
    tokens: &CancelTokens,
    event_tx: &mpsc::Sender<Msg>,
) {
    match effect {
        Effect::SubmitQuery { query } => {
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let msg = submit_query(backend.as_ref(), &query).await;
                let _ = event_tx.send(msg);
            });
        }
        Effect::PollJob { job_id } => {
            let token = CancellationToken::new();
            if let Some(previous) = lock(tokens).insert(job_id.clone(), token.clone()) {
                previous.cancel();
            }
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            let tokens = tokens.clone();
            tokio::spawn(async move {
                let outcome = JobPoller::new(job_id.clone(), polling)
                    .run(backend.as_ref(), &token)
                    .await;
                release(&tokens, &job_id, &token);
                match outcome {
                    Some(outcome) if !token.is_cancelled() => {
                        let _ = event_tx.send(Msg::JobFinished { job_id, outcome });
                    }
                    _ => {}
                }
            });
        }
        Effect::CancelJob { job_id } => match lock(tokens).remove(&job_id) {
            Some(token) => {
                desk_info!("Cancelling job {}", job_id);
                token.cancel();
            }
            None => desk_debug!("Cancel for job {} ignored, not running", job_id),
        },
    }
}

/// Drops the job's token. A cancelled token was already removed, or replaced
/// by a newer poller for the same id.
fn release(tokens: &CancelTokens, job_id: &JobId, token: &CancellationToken) {
    if !token.is_cancelled() {
        lock(tokens).remove(job_id);
    }
}

fn lock(tokens: &CancelTokens) -> std::sync::MutexGuard<'_, HashMap<JobId, CancellationToken>> {
    // Poisoning cannot leave the map half-updated.
    tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

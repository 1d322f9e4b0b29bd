use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use askdesk_core::Effect;
use askdesk_engine::{EngineConfig, EngineError, EngineHandle};
use desk_logging::{desk_debug, desk_info};

use super::app::Input;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, input_tx: mpsc::Sender<Input>) -> Result<Self, EngineError> {
        desk_info!(
            "Answering service at {} (poll every {:?}, max {} attempts)",
            config.backend.base_url,
            config.polling.interval,
            config.polling.max_attempts
        );
        let engine = EngineHandle::new(config)?;
        let runner = Self { engine };
        runner.spawn_event_loop(input_tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match &effect {
                Effect::SubmitQuery { query } => {
                    desk_debug!("SubmitQuery query_len={}", query.len());
                }
                Effect::PollJob { job_id } => desk_debug!("PollJob job_id={}", job_id),
                Effect::CancelJob { job_id } => desk_debug!("CancelJob job_id={}", job_id),
            }
            self.engine.execute(effect);
        }
    }

    fn spawn_event_loop(&self, input_tx: mpsc::Sender<Input>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(msg) = engine.recv_timeout(Duration::from_millis(250)) {
                if input_tx.send(Input::Msg(msg)).is_err() {
                    break;
                }
            }
        });
    }
}

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use askdesk_core::{update, AppState, Msg};
use desk_logging::{desk_info, desk_warn};

use super::config::{self, AppConfig};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::render::Renderer;

const CANCEL_COMMAND: &str = "/cancel";
const QUIT_COMMAND: &str = "/quit";

/// Everything the main loop reacts to.
pub enum Input {
    Msg(Msg),
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = config::config_path();
    let loaded = config::load_config(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_else(|_| AppConfig::default());

    logging::initialize(
        LogDestination::from_flag(config.log_to_file),
        desk_logging::level_from_name(&config.log_level),
    );
    if let Err(err) = &loaded {
        desk_warn!("Using default configuration: {:#}", err);
    }

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    let runner = EffectRunner::new(config.engine_config(), input_tx.clone())?;
    spawn_stdin_reader(input_tx);

    let stdout = io::stdout();
    let mut renderer = Renderer::new(stdout.lock());
    renderer.notice(&format!(
        "connected to {}; type a question, {CANCEL_COMMAND} to abandon a pending answer, {QUIT_COMMAND} to exit",
        config.base_url
    ))?;

    let mut state = AppState::new();
    while let Ok(input) = input_rx.recv() {
        let msg = match input {
            Input::Msg(msg) => msg,
            Input::Quit => break,
        };
        if is_blocked_submission(&state, &msg) {
            renderer.notice("still waiting for the previous answer")?;
        }

        let (next, effects) = update(state, msg);
        state = next;
        runner.enqueue(effects);

        if state.consume_dirty() {
            renderer.render(&state.view())?;
        }
    }

    if state.active_job().is_some() {
        let (_state, effects) = update(state, Msg::CancelRequested);
        runner.enqueue(effects);
    }
    desk_info!("Session ended");
    Ok(())
}

/// A non-blank query typed while the previous one is still unanswered.
fn is_blocked_submission(state: &AppState, msg: &Msg) -> bool {
    match msg {
        Msg::QuerySubmitted(raw) => !raw.trim().is_empty() && state.is_awaiting(),
        _ => false,
    }
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let command = line.trim();
            let input = if command == QUIT_COMMAND {
                Input::Quit
            } else if command == CANCEL_COMMAND {
                Input::Msg(Msg::CancelRequested)
            } else {
                Input::Msg(Msg::QuerySubmitted(line))
            };
            let quit = matches!(input, Input::Quit);
            if input_tx.send(input).is_err() || quit {
                return;
            }
        }
        let _ = input_tx.send(Input::Quit);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting_state() -> AppState {
        let (state, _) = update(AppState::new(), Msg::QuerySubmitted("first".to_string()));
        assert!(state.is_awaiting());
        state
    }

    #[test]
    fn second_query_while_awaiting_is_blocked() {
        let state = awaiting_state();
        assert!(is_blocked_submission(
            &state,
            &Msg::QuerySubmitted("second".to_string())
        ));
    }

    #[test]
    fn blank_line_while_awaiting_is_not_reported() {
        let state = awaiting_state();
        assert!(!is_blocked_submission(&state, &Msg::QuerySubmitted(String::new())));
        assert!(!is_blocked_submission(
            &state,
            &Msg::QuerySubmitted("  \t ".to_string())
        ));
    }

    #[test]
    fn idle_state_blocks_nothing() {
        let state = AppState::new();
        assert!(!is_blocked_submission(&state, &Msg::QuerySubmitted("q".to_string())));
        assert!(!is_blocked_submission(&awaiting_state(), &Msg::CancelRequested));
    }
}

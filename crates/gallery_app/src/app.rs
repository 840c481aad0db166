use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use gallery_core::{update, AppState, FormState, Msg, RunResultKind, RunState};

use crate::effects::EffectRunner;
use crate::render::TerminalRenderer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drives one run from the terminal and reports how it ended.
///
/// Returns `None` when the form was rejected before anything started.
pub fn run_app(form: FormState, runner: EffectRunner) -> Option<RunResultKind> {
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_stdin_reader(msg_tx.clone());

    let mut state = AppState::with_form(form);
    let mut renderer = TerminalRenderer::new();
    let _ = msg_tx.send(Msg::StartClicked);

    loop {
        let mut inbox: Vec<Msg> = msg_rx.try_iter().collect();
        inbox.extend(runner.poll());
        inbox.push(Msg::Tick);

        for msg in inbox {
            state = dispatch(state, msg, &runner);
        }

        if state.consume_dirty() {
            renderer.render(&state.view());
        }

        match state.run_state() {
            RunState::Finished(result) => return Some(result),
            RunState::Idle if state.view().config_error.is_some() => return None,
            _ => {}
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn dispatch(state: AppState, msg: Msg, runner: &EffectRunner) -> AppState {
    let mut pending = vec![msg];
    let mut state = state;
    while let Some(msg) = pending.pop() {
        let (next, effects) = update(state, msg);
        state = next;
        if !effects.is_empty() {
            engine_debug!("Executing {} effect(s)", effects.len());
            pending.extend(runner.execute(effects));
        }
    }
    state
}

/// Forwards terminal commands; stdin closing just ends the reader.
fn spawn_stdin_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let msg = match line.trim().to_ascii_lowercase().as_str() {
                "cancel" | "c" | "stop" => Msg::CancelClicked,
                "start" => Msg::StartClicked,
                "" => continue,
                other => {
                    engine_info!("Ignoring terminal input {:?}", other);
                    continue;
                }
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}

use crate::{validate_form, AppState, Effect, Msg, RunResultKind, RunState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(url) => {
            state.form_mut().url = url;
            Vec::new()
        }
        Msg::PrefixChanged(prefix) => {
            state.form_mut().prefix = prefix;
            Vec::new()
        }
        Msg::BaseDirChosen(dir) => {
            state.form_mut().base_dir = Some(dir);
            Vec::new()
        }
        Msg::PagedToggled(on) => {
            state.form_mut().paged = on;
            Vec::new()
        }
        Msg::SlideToggled(on) => {
            state.form_mut().slides = on;
            Vec::new()
        }
        Msg::StartClicked => {
            // Single-flight: a second start while a run is active is ignored.
            if !state.can_start() {
                return (state, Vec::new());
            }
            match validate_form(state.form()) {
                Ok(plan) => {
                    state.set_config_error(None);
                    state.clear_log();
                    state.set_run_state(RunState::Running);
                    vec![Effect::StartRun(plan)]
                }
                Err(err) => {
                    state.push_log(format!("Error: {err}"));
                    state.set_config_error(Some(err));
                    Vec::new()
                }
            }
        }
        Msg::CancelClicked => {
            if state.run_state() == RunState::Running {
                state.set_run_state(RunState::Cancelling);
                state.push_log("Cancelling...".to_string());
                vec![Effect::CancelRun]
            } else {
                Vec::new()
            }
        }
        Msg::StartRejected(reason) => {
            if matches!(state.run_state(), RunState::Running | RunState::Cancelling) {
                state.set_run_state(RunState::Finished(RunResultKind::Failed));
            }
            state.push_log(format!("Error: {reason}"));
            Vec::new()
        }
        Msg::Progress(line) => {
            state.push_log(line);
            Vec::new()
        }
        Msg::RunFinished(result) => {
            state.set_run_state(RunState::Finished(result));
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

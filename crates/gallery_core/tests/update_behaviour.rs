use std::path::PathBuf;
use std::sync::Once;

use gallery_core::{
    update, AppState, ConfigError, Effect, FormState, Msg, RunPlan, RunResultKind, RunState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn filled_form() -> AppState {
    AppState::with_form(FormState {
        url: "https://mp.example.com/s/abc".to_string(),
        prefix: "gallery".to_string(),
        base_dir: Some(PathBuf::from("/tmp/out")),
        paged: true,
        slides: false,
    })
}

fn apply(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    msgs.into_iter()
        .fold((state, Vec::new()), |(state, mut all), msg| {
            let (next, effects) = update(state, msg);
            all.extend(effects);
            (next, all)
        })
}

#[test]
fn form_edits_update_state_and_mark_dirty() {
    init_logging();
    let (mut state, effects) = apply(
        AppState::new(),
        vec![
            Msg::UrlChanged("https://a.example.com/post".to_string()),
            Msg::PrefixChanged("trip".to_string()),
            Msg::BaseDirChosen(PathBuf::from("/data")),
            Msg::SlideToggled(false),
        ],
    );

    assert!(effects.is_empty());
    let form = state.form().clone();
    assert_eq!(form.url, "https://a.example.com/post");
    assert_eq!(form.prefix, "trip");
    assert_eq!(form.base_dir, Some(PathBuf::from("/data")));
    assert!(form.paged);
    assert!(!form.slides);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn start_with_valid_form_emits_run_plan() {
    init_logging();
    let (state, effects) = update(filled_form(), Msg::StartClicked);

    assert_eq!(
        effects,
        vec![Effect::StartRun(RunPlan {
            article_url: "https://mp.example.com/s/abc".to_string(),
            base_dir: PathBuf::from("/tmp/out"),
            prefix: "gallery".to_string(),
            paged: true,
            slides: false,
        })]
    );
    let view = state.view();
    assert_eq!(view.run_state, RunState::Running);
    assert!(!view.can_start);
    assert!(view.can_cancel);
}

#[test]
fn second_start_while_running_is_ignored() {
    init_logging();
    let (state, _) = update(filled_form(), Msg::StartClicked);
    let before = state.clone();

    let (state, effects) = update(state, Msg::StartClicked);

    assert!(effects.is_empty());
    assert_eq!(state, before);
}

#[test]
fn invalid_form_reports_config_error_without_effects() {
    init_logging();
    let cases = vec![
        (Msg::UrlChanged("   ".to_string()), ConfigError::MissingUrl),
        (Msg::PrefixChanged(String::new()), ConfigError::MissingPrefix),
        (Msg::PagedToggled(false), ConfigError::NoDocumentKind),
    ];

    for (edit, expected) in cases {
        let (state, effects) = apply(filled_form(), vec![edit, Msg::StartClicked]);
        assert!(effects.is_empty());
        let view = state.view();
        assert_eq!(view.config_error, Some(expected));
        assert_eq!(view.run_state, RunState::Idle);
        assert!(view.log_lines[0].starts_with("Error: "));
    }
}

#[test]
fn non_http_url_and_bad_prefix_are_rejected() {
    init_logging();
    let (state, _) = apply(
        filled_form(),
        vec![Msg::UrlChanged("ftp://x/y".to_string()), Msg::StartClicked],
    );
    assert!(matches!(
        state.view().config_error,
        Some(ConfigError::InvalidUrl(_))
    ));

    let (state, _) = apply(
        filled_form(),
        vec![Msg::PrefixChanged("a:b".to_string()), Msg::StartClicked],
    );
    assert!(matches!(
        state.view().config_error,
        Some(ConfigError::InvalidPrefix(_))
    ));
}

#[test]
fn missing_base_dir_is_a_config_error() {
    init_logging();
    let mut form = filled_form().form().clone();
    form.base_dir = None;

    let (state, effects) = update(AppState::with_form(form), Msg::StartClicked);

    assert!(effects.is_empty());
    assert_eq!(state.view().config_error, Some(ConfigError::MissingBaseDir));
}

#[test]
fn cancel_only_applies_while_running() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(state.run_state(), RunState::Idle);

    let (state, _) = update(filled_form(), Msg::StartClicked);
    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(effects, vec![Effect::CancelRun]);
    assert_eq!(state.run_state(), RunState::Cancelling);

    let (state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
    assert!(!state.view().can_start);
}

#[test]
fn finished_run_reopens_admission_and_clears_previous_log() {
    init_logging();
    let (state, _) = apply(
        filled_form(),
        vec![
            Msg::StartClicked,
            Msg::Progress("Downloading (1/1): https://img".to_string()),
            Msg::RunFinished(RunResultKind::Completed),
        ],
    );
    let view = state.view();
    assert_eq!(view.run_state, RunState::Finished(RunResultKind::Completed));
    assert!(view.can_start);
    assert_eq!(view.log_lines, vec!["Downloading (1/1): https://img".to_string()]);

    let (state, effects) = update(state, Msg::StartClicked);
    assert_eq!(effects.len(), 1);
    assert!(state.view().log_lines.is_empty());
}

#[test]
fn rejected_start_marks_run_failed() {
    init_logging();
    let (state, _) = apply(
        filled_form(),
        vec![
            Msg::StartClicked,
            Msg::StartRejected("a run is already in progress".to_string()),
        ],
    );

    assert_eq!(state.run_state(), RunState::Finished(RunResultKind::Failed));
    assert!(state.view().can_start);
}

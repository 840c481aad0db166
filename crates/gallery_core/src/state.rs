use std::collections::VecDeque;
use std::path::PathBuf;

use crate::view_model::AppViewModel;
use crate::ConfigError;

/// Log lines kept for display; older lines are dropped first.
pub const MAX_LOG_LINES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    /// Cancel requested; waiting for the worker to finish.
    Cancelling,
    Finished(RunResultKind),
}

/// How the last run ended, as far as the foreground cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResultKind {
    Completed,
    NothingDownloaded,
    Failed,
    Cancelled,
}

/// Current contents of the run form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub url: String,
    pub prefix: String,
    pub base_dir: Option<PathBuf>,
    pub paged: bool,
    pub slides: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            url: String::new(),
            prefix: String::new(),
            base_dir: None,
            paged: true,
            slides: true,
        }
    }
}

/// A validated form, ready to become a worker request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub article_url: String,
    pub base_dir: PathBuf,
    pub prefix: String,
    pub paged: bool,
    pub slides: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    form: FormState,
    run: RunState,
    log: VecDeque<String>,
    /// Total lines ever appended; lets renderers find what is new.
    log_total: usize,
    config_error: Option<ConfigError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(form: FormState) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            run_state: self.run,
            can_start: self.can_start(),
            can_cancel: self.run == RunState::Running,
            form: self.form.clone(),
            log_lines: self.log.iter().cloned().collect(),
            log_total: self.log_total,
            config_error: self.config_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    /// Start is only offered while no run is active.
    pub(crate) fn can_start(&self) -> bool {
        matches!(self.run, RunState::Idle | RunState::Finished(_))
    }

    pub(crate) fn form_mut(&mut self) -> &mut FormState {
        self.dirty = true;
        &mut self.form
    }

    pub(crate) fn set_run_state(&mut self, run: RunState) {
        if self.run != run {
            self.run = run;
            self.dirty = true;
        }
    }

    pub(crate) fn set_config_error(&mut self, error: Option<ConfigError>) {
        if self.config_error != error {
            self.config_error = error;
            self.dirty = true;
        }
    }

    pub(crate) fn push_log(&mut self, line: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
        self.log_total += 1;
        self.dirty = true;
    }

    /// Progress history belongs to a single run.
    pub(crate) fn clear_log(&mut self) {
        if !self.log.is_empty() {
            self.log.clear();
            self.dirty = true;
        }
    }
}

use crate::{ConfigError, FormState, RunState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub run_state: RunState,
    pub can_start: bool,
    pub can_cancel: bool,
    pub form: FormState,
    /// Visible progress lines, oldest first.
    pub log_lines: Vec<String>,
    /// Number of lines appended since startup, including dropped ones.
    pub log_total: usize,
    pub config_error: Option<ConfigError>,
    pub dirty: bool,
}

impl AppViewModel {
    /// Lines appended after `seen` lines had been rendered.
    pub fn lines_since(&self, seen: usize) -> &[String] {
        let dropped = self.log_total - self.log_lines.len();
        let start = seen.saturating_sub(dropped).min(self.log_lines.len());
        &self.log_lines[start..]
    }
}

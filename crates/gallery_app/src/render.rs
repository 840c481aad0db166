use std::io::{self, Write};

use gallery_core::{AppViewModel, RunState};

/// Prints progress lines that have not been shown yet.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    seen: usize,
    last_state: Option<RunState>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in view.lines_since(self.seen) {
            let _ = writeln!(out, "{line}");
        }
        self.seen = view.log_total;

        if self.last_state != Some(view.run_state) {
            if view.run_state == RunState::Running {
                let _ = writeln!(out, "(type \"cancel\" and press Enter to stop the run)");
            }
            self.last_state = Some(view.run_state);
        }
        let _ = out.flush();
    }
}
